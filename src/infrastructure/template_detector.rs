use crate::domain::generation::Operation;

/// Header prefixes that mark an UPDATE filter column.
const WHERE_PREFIXES: [&str; 4] = ["where_", "where:", "or_where_", "or_where:"];
/// Header prefixes that mark an UPDATE assignment column.
const SET_PREFIXES: [&str; 2] = ["set_", "set:"];
const INSERT_MARKERS: [&str; 5] = ["id", "name", "email", "created", "updated"];

/// Best guess at which statement a header row was prepared for.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TemplateGuess {
    pub kind: Operation,
    pub confidence: f64,
    pub update_hits: usize,
    pub insert_hits: usize,
}

/// Scores header names against UPDATE and INSERT naming habits. Markers only
/// count at the start of a header, and UPDATE is guessed only when some
/// header is a WHERE marker, since an UPDATE without one cannot be rendered.
pub fn detect_template_type(headers: &[String]) -> TemplateGuess {
    let normalized = headers
        .iter()
        .map(|header| header.trim().to_lowercase())
        .collect::<Vec<_>>();

    let where_hits = normalized
        .iter()
        .filter(|header| starts_with_any(header, &WHERE_PREFIXES))
        .count();
    let set_hits = normalized
        .iter()
        .filter(|header| starts_with_any(header, &SET_PREFIXES))
        .count();
    let update_hits = where_hits + set_hits;
    let insert_hits = normalized
        .iter()
        .filter(|header| {
            INSERT_MARKERS
                .iter()
                .any(|marker| header.split(['_', ' ', '-']).any(|part| part == *marker))
        })
        .count();

    let total = headers.len().max(1) as f64;
    if where_hits > 0 {
        TemplateGuess {
            kind: Operation::Update,
            confidence: (0.5 + 0.5 * update_hits as f64 / total).min(1.0),
            update_hits,
            insert_hits,
        }
    } else {
        TemplateGuess {
            kind: Operation::Insert,
            confidence: (0.5 + 0.5 * insert_hits as f64 / total).min(1.0),
            update_hits,
            insert_hits,
        }
    }
}

fn starts_with_any(header: &str, prefixes: &[&str]) -> bool {
    prefixes.iter().any(|prefix| header.starts_with(*prefix))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers(names: &[&str]) -> Vec<String> {
        names.iter().map(|name| name.to_string()).collect()
    }

    #[test]
    fn where_and_set_markers_suggest_update() {
        let guess = detect_template_type(&headers(&["where_id", "set_status", "note"]));

        assert_eq!(guess.kind, Operation::Update);
        assert_eq!(guess.update_hits, 2);
        assert!(guess.confidence > 0.8);
    }

    #[test]
    fn plain_entity_columns_suggest_insert() {
        let guess = detect_template_type(&headers(&["id", "name", "email", "created_at"]));

        assert_eq!(guess.kind, Operation::Insert);
        assert_eq!(guess.insert_hits, 4);
        assert_eq!(guess.confidence, 1.0);
    }

    #[test]
    fn unknown_columns_are_a_weak_insert_guess() {
        let guess = detect_template_type(&headers(&["alpha", "beta"]));

        assert_eq!(guess.kind, Operation::Insert);
        assert_eq!(guess.confidence, 0.5);
    }

    #[test]
    fn marker_fragments_inside_names_stay_insert() {
        let guess = detect_template_type(&headers(&[
            "id",
            "asset_tag",
            "dataset_name",
            "renew_date",
            "condition_code",
        ]));

        assert_eq!(guess.kind, Operation::Insert);
        assert_eq!(guess.update_hits, 0);
    }

    #[test]
    fn set_markers_without_where_stay_insert() {
        let guess = detect_template_type(&headers(&["set_name", "set:status"]));

        assert_eq!(guess.kind, Operation::Insert);
        assert_eq!(guess.update_hits, 2);
    }

    #[test]
    fn or_where_prefix_counts_as_filter() {
        let guess = detect_template_type(&headers(&["OR_WHERE_code", "name"]));

        assert_eq!(guess.kind, Operation::Update);
        assert_eq!(guess.update_hits, 1);
    }
}
