//! Option ranking for search-select fields

use crate::domain::value_objects::SelectOption;

/// Lowercase and strip Spanish accents so "Pérez" matches "perez"
pub fn fold(text: &str) -> String {
    text.trim()
        .to_lowercase()
        .chars()
        .map(|c| match c {
            'á' | 'à' | 'ä' => 'a',
            'é' | 'è' | 'ë' => 'e',
            'í' | 'ì' | 'ï' => 'i',
            'ó' | 'ò' | 'ö' => 'o',
            'ú' | 'ù' | 'ü' => 'u',
            'ñ' => 'n',
            other => other,
        })
        .collect()
}

/// Match quality, lower is better
fn rank(label: &str, query: &str) -> Option<u8> {
    if label == query {
        Some(0)
    } else if label.starts_with(query) {
        Some(1)
    } else if label.split_whitespace().any(|word| word.starts_with(query)) {
        Some(2)
    } else if label.contains(query) {
        Some(3)
    } else {
        None
    }
}

/// Options matching `query`, best first, at most `limit`.
///
/// Ties keep their original order. An empty query returns the first
/// `limit` options unchanged.
pub fn rank_options(options: &[SelectOption], query: &str, limit: usize) -> Vec<SelectOption> {
    let query = fold(query);
    if query.is_empty() {
        return options.iter().take(limit).cloned().collect();
    }

    let mut ranked: Vec<(u8, usize, &SelectOption)> = options
        .iter()
        .enumerate()
        .filter_map(|(i, option)| {
            let label = fold(&option.label);
            let value = fold(&option.value.to_string());
            rank(&label, &query)
                .or_else(|| (value == query).then_some(0))
                .map(|r| (r, i, option))
        })
        .collect();
    ranked.sort_by_key(|(r, i, _)| (*r, *i));
    ranked.into_iter().take(limit).map(|(_, _, o)| o.clone()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn alumnos() -> Vec<SelectOption> {
        vec![
            SelectOption::new("Martín Gómez", 1),
            SelectOption::new("Ana Martínez", 2),
            SelectOption::new("Marta", 3),
            SelectOption::new("Romarta Díaz", 4),
        ]
    }

    #[test]
    fn test_rank_order() {
        let found = rank_options(&alumnos(), "mart", 10);
        let labels: Vec<&str> = found.iter().map(|o| o.label.as_str()).collect();
        assert_eq!(labels, vec!["Martín Gómez", "Marta", "Ana Martínez", "Romarta Díaz"]);
    }

    #[test]
    fn test_exact_match_first_and_accents_folded() {
        let found = rank_options(&alumnos(), "MARTA", 10);
        assert_eq!(found[0].label, "Marta");
        let found = rank_options(&alumnos(), "gomez", 10);
        assert_eq!(found.len(), 1);
    }

    #[test]
    fn test_limit_and_empty_query() {
        assert_eq!(rank_options(&alumnos(), "mar", 2).len(), 2);
        assert_eq!(rank_options(&alumnos(), "  ", 3).len(), 3);
        assert!(rank_options(&alumnos(), "zzz", 3).is_empty());
    }

    #[test]
    fn test_matches_by_id() {
        let found = rank_options(&alumnos(), "4", 10);
        assert_eq!(found[0].label, "Romarta Díaz");
    }
}
