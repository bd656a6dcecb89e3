pub mod labor;
pub mod quantity;
pub mod record;
pub mod worker;

/// Folds a user-supplied choice into a comparison key: lowercase, with
/// whitespace, `-` and `_` removed. "Trabajador 1", "trabajador_1" and
/// "TRABAJADOR-1" all fold to "trabajador1".
pub(crate) fn choice_key(raw: &str) -> String {
    raw.trim()
        .chars()
        .filter(|ch| !ch.is_whitespace() && *ch != '-' && *ch != '_')
        .flat_map(char::to_lowercase)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::choice_key;

    #[test]
    fn choice_key_ignores_case_and_separators() {
        assert_eq!(choice_key("Trabajador 1"), "trabajador1");
        assert_eq!(choice_key(" trabajador_1 "), "trabajador1");
        assert_eq!(choice_key("MONITOREO-de-Plagas"), "monitoreodeplagas");
    }
}
