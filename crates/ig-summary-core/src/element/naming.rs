//! Human readable names for element paths

use indexmap::IndexMap;
use once_cell::sync::Lazy;
use regex::Regex;

static CAMEL_CASE_BOUNDARY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"([a-z])([A-Z])").expect("valid regex"));

static LAST_PATH_ITEM: Lazy<Regex> =
    Lazy::new(|| Regex::new(r".*\.([a-zA-Z]+(\[x\])?)").expect("valid regex"));

/// Connector words that stay lower case inside a title
const SMALL_WORDS: &[&str] = &[
    "a", "an", "and", "as", "at", "but", "by", "en", "for", "if", "in", "nor", "of", "on", "or",
    "per", "the", "to", "v", "vs", "via",
];

/// `Observation.component.valueQuantity` → `Component > Value Quantity`, after prefixes are gone
///
/// Path separators become ` > `, the first `[x]` marker is dropped, camelCase
/// is split into words, words are title-cased and the configured touch-ups are
/// applied in order (first occurrence of each).
pub fn humanize(name: &str, touch_ups: &IndexMap<String, String>) -> String {
    let spaced = name.replace('.', " > ").replacen("[x]", "", 1);
    let split = CAMEL_CASE_BOUNDARY.replace_all(&spaced, "$1 $2");
    let mut humanized = title_case(&split);

    for (find, replace) in touch_ups {
        humanized = humanized.replacen(find.as_str(), replace, 1);
    }
    humanized
}

/// Capitalize each word
///
/// Small connector words are left alone unless they open or close the title;
/// words that already carry a capital after their first letter (`DNA`,
/// `mCODE`) are kept as written.
pub fn title_case(text: &str) -> String {
    let words: Vec<&str> = text.split(' ').collect();
    let last = words.len().saturating_sub(1);

    words
        .iter()
        .enumerate()
        .map(|(position, word)| {
            let inner_capital = word.chars().skip(1).any(char::is_uppercase);
            let small = SMALL_WORDS.contains(word);
            if word.is_empty() || inner_capital || (small && position != 0 && position != last) {
                return word.to_string();
            }
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// `[a, b]` → `a or b`; `[a, b, c]` → `a, b, or c`
pub fn join_with_or<S: AsRef<str>>(items: &[S]) -> String {
    let items: Vec<&str> = items.iter().map(AsRef::as_ref).collect();
    if items.len() < 3 {
        return items.join(" or ");
    }
    let joined = items.join(", ");
    match joined.rfind(", ") {
        Some(split) => format!("{}, or {}", &joined[..split], &joined[split + 2..]),
        None => joined,
    }
}

/// Final segment of a dotted path, keeping a trailing `[x]`
pub fn last_path_item(path: &str) -> String {
    LAST_PATH_ITEM.replacen(path, 1, "$1").into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_humanize() {
        let none = IndexMap::new();
        assert_eq!(humanize("value[x]", &none), "Value");
        assert_eq!(
            humanize("component.valueCodeableConcept", &none),
            "Component > Value Codeable Concept"
        );
        assert_eq!(humanize("dateOfDiagnosis", &none), "Date Of Diagnosis");
        assert_eq!(humanize("reason for.referral", &none), "Reason for > Referral");
    }

    #[test]
    fn test_touch_ups_apply_in_order() {
        let mut touch_ups = IndexMap::new();
        touch_ups.insert("Dna".to_string(), "DNA".to_string());
        touch_ups.insert("DNA Region".to_string(), "Region".to_string());
        assert_eq!(humanize("dnaRegion", &touch_ups), "Region");
    }

    #[test]
    fn test_title_case_keeps_inner_capitals() {
        assert_eq!(title_case("mCODE status of the tumor"), "mCODE Status of the Tumor");
        assert_eq!(title_case("for"), "For");
        assert_eq!(title_case("Stage > Of"), "Stage > Of");
    }

    #[test]
    fn test_join_with_or() {
        assert_eq!(join_with_or::<&str>(&[]), "");
        assert_eq!(join_with_or(&["a"]), "a");
        assert_eq!(join_with_or(&["a", "b"]), "a or b");
        assert_eq!(join_with_or(&["a", "b", "c"]), "a, b, or c");
    }

    #[test]
    fn test_last_path_item() {
        assert_eq!(last_path_item("Observation.component.value[x]"), "value[x]");
        assert_eq!(last_path_item("Observation.code"), "code");
        assert_eq!(last_path_item("Observation"), "Observation");
    }
}
