pub mod alias;
pub mod article;
pub mod keywords;

pub use alias::AliasTable;
pub use article::Article;
pub use keywords::KeywordSet;
