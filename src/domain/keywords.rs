use regex::Regex;

/// Name tokens of this length or shorter are dropped ("PT", "di"); such
/// fragments match far too much Indonesian text.
const MIN_TOKEN_LEN: usize = 2;

/// Ordered set of search terms for one stock code: the code itself, the
/// cleaned company name, its longer tokens and any caller-supplied extras.
/// Deduplicated and sorted case-insensitively; never empty for a non-blank
/// code.
#[derive(Debug, Clone)]
pub struct KeywordSet {
    keywords: Vec<String>,
    matcher: Option<Regex>,
}

impl KeywordSet {
    /// Derive the keyword set. A missing company name degrades to the code
    /// plus extras; this never fails.
    pub fn build(code: &str, name: Option<&str>, extras: &[String]) -> Self {
        let mut keywords: Vec<String> = Vec::new();
        push_unique(&mut keywords, code);

        if let Some(name) = name {
            let clean = strip_legal_suffix(name);
            if !clean.is_empty() {
                push_unique(&mut keywords, &clean);
                for token in clean.split(|c: char| !(c.is_alphanumeric() || c == '_')) {
                    if token.chars().count() > MIN_TOKEN_LEN {
                        push_unique(&mut keywords, token);
                    }
                }
            }
        }

        for extra in extras {
            push_unique(&mut keywords, extra);
        }

        keywords.sort_by_key(|k| k.to_lowercase());
        let matcher = compile_matcher(&keywords);
        Self { keywords, matcher }
    }

    /// Whole-word, case-insensitive match of any keyword against `text`.
    /// "BCA" matches "saham BCA naik" but neither "BCAX" nor "ABCA".
    pub fn matches(&self, text: &str) -> bool {
        self.matcher.as_ref().map_or(false, |re| re.is_match(text))
    }

    /// The comma-joined form stored alongside cached articles.
    pub fn joined(&self) -> String {
        self.keywords.join(", ")
    }

    pub fn as_slice(&self) -> &[String] {
        &self.keywords
    }

    pub fn len(&self) -> usize {
        self.keywords.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keywords.is_empty()
    }
}

/// Remove the "Tbk" / "Tbk." listing suffix wherever it appears in the name.
fn strip_legal_suffix(name: &str) -> String {
    let re = Regex::new(r"(?i)\bTbk\b\.?").unwrap();
    re.replace_all(name, "").trim().to_string()
}

fn push_unique(keywords: &mut Vec<String>, candidate: &str) {
    let candidate = candidate.trim();
    if candidate.is_empty() {
        return;
    }
    let lowered = candidate.to_lowercase();
    if keywords.iter().any(|k| k.to_lowercase() == lowered) {
        return;
    }
    keywords.push(candidate.to_string());
}

/// One combined alternation so each entry is scanned once, not once per
/// keyword. Keywords are escaped, so the pattern always compiles.
fn compile_matcher(keywords: &[String]) -> Option<Regex> {
    if keywords.is_empty() {
        return None;
    }
    let alternation = keywords
        .iter()
        .map(|k| regex::escape(k))
        .collect::<Vec<_>>()
        .join("|");
    Regex::new(&format!(r"(?i)\b(?:{})\b", alternation)).ok()
}
