use regex::Regex;
use std::sync::OnceLock;

/// Redact API keys, bearer tokens, and `key=value` secrets from command
/// output before it is persisted or logged.
pub fn mask_secrets(text: &str) -> String {
    static PATTERNS: OnceLock<Vec<(Regex, &'static str)>> = OnceLock::new();
    let patterns = PATTERNS.get_or_init(|| {
        [
            (r"sk-[a-zA-Z0-9_\-]{20,}", "[MASKED]"),
            (r"pk-[a-zA-Z0-9]{20,}", "[MASKED]"),
            (r"Bearer\s+[a-zA-Z0-9._\-]+", "Bearer [MASKED]"),
            (
                r"(?i)(password|secret|token|api_key|apikey)=[^\s&]+",
                "$1=[MASKED]",
            ),
        ]
        .into_iter()
        .filter_map(|(p, r)| Regex::new(p).ok().map(|re| (re, r)))
        .collect()
    });

    let mut result = text.to_string();
    for (re, replacement) in patterns {
        result = re.replace_all(&result, *replacement).into_owned();
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn masks_openai_keys() {
        let masked = mask_secrets("401: sk-proj-abcdefghij1234567890XYZ rejected");
        assert!(masked.contains("[MASKED]"));
        assert!(!masked.contains("sk-proj"));
    }

    #[test]
    fn masks_bearer_and_pairs() {
        let masked = mask_secrets("Authorization: Bearer eyJ.x-y password=hunter2&token=abc");
        assert!(masked.contains("Bearer [MASKED]"));
        assert!(masked.contains("password=[MASKED]"));
        assert!(masked.contains("token=[MASKED]"));
    }

    #[test]
    fn env_placeholders_untouched() {
        let line = "DATABASE_URL=<INSERT_VALUE>";
        assert_eq!(mask_secrets(line), line);
    }

    #[test]
    fn plain_build_output_untouched() {
        let input = "error TS2304: Cannot find name 'foo'.";
        assert_eq!(mask_secrets(input), input);
    }
}
