/// Common place names and their location codes
pub const LOCATION_CODES: &[(&str, &str)] = &[
    ("oslo", "0.20061"),
    ("bergen", "0.20003"),
    ("trondheim", "0.20016"),
    ("stavanger", "0.20012"),
    ("kristiansand", "0.20011"),
    ("tromso", "0.20019"),
    ("drammen", "0.20006"),
    ("fredrikstad", "0.20001"),
    ("sandnes", "0.20012.20253"),
    ("asker", "0.20002"),
    ("bodo", "0.20018"),
    ("aalesund", "0.20015"),
    // Counties
    ("viken", "0.20030"),
    ("vestland", "0.20046"),
    ("rogaland", "0.20011"),
    ("trondelag", "0.20050"),
    ("nordland", "0.20018"),
    ("innlandet", "0.20034"),
    ("vestfold_telemark", "0.20038"),
    ("agder", "0.20042"),
];

/// Code for a known place name, case-insensitive
pub fn location_code(name: &str) -> Option<&'static str> {
    LOCATION_CODES
        .iter()
        .find(|(known, _)| known.eq_ignore_ascii_case(name.trim()))
        .map(|(_, code)| *code)
}

/// Code for a place name, or the input unchanged when it is not in the table
pub fn resolve_location(name_or_code: &str) -> String {
    location_code(name_or_code)
        .map(str::to_string)
        .unwrap_or_else(|| name_or_code.to_string())
}

/// Whether the input already has the shape of a location code, e.g. `0.20012.20253`
pub fn looks_like_location_code(s: &str) -> bool {
    s.trim().strip_prefix("0.").is_some_and(|rest| {
        !rest.is_empty() && rest.chars().all(|c| c.is_ascii_digit() || c == '.')
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_names_resolve() {
        assert_eq!(location_code("oslo"), Some("0.20061"));
        assert_eq!(location_code(" Bergen "), Some("0.20003"));
        assert_eq!(resolve_location("Sandnes"), "0.20012.20253");
    }

    #[test]
    fn unknown_passes_through() {
        assert_eq!(location_code("0.20061"), None);
        assert_eq!(resolve_location("0.22042"), "0.22042");
        assert_eq!(resolve_location("Hamar"), "Hamar");
    }

    #[test]
    fn recognizes_raw_codes() {
        assert!(looks_like_location_code("0.20061"));
        assert!(looks_like_location_code("0.20012.20253"));
        assert!(!looks_like_location_code("0."));
        assert!(!looks_like_location_code("Hamar"));
        assert!(!looks_like_location_code("1.20061"));
        assert!(!looks_like_location_code("0.2006a"));
    }
}
