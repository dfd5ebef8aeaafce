use lazy_static::lazy_static;
use regex::Regex;

use super::dto::NutritionEstimate;
use super::error::ExtractionError;

/// Widest `{ ... }` span: first opening brace to last closing brace.
///
/// Tolerates prose and code fences around the object. Two separate objects
/// in one answer yield a span that does not parse, which is reported as a
/// syntax failure rather than repaired.
pub fn json_span(raw: &str) -> Option<&str> {
    lazy_static! {
        static ref OBJECT_RE: Regex = Regex::new(r"(?s)\{.*\}").unwrap();
    }
    OBJECT_RE.find(raw).map(|m| m.as_str())
}

/// Parse-or-fail extraction of a [`NutritionEstimate`] from model output.
pub fn extract_estimate(raw: &str) -> Result<NutritionEstimate, ExtractionError> {
    let span = json_span(raw).ok_or(ExtractionError::NoJson)?;
    let value: serde_json::Value = serde_json::from_str(span).map_err(ExtractionError::Syntax)?;
    let estimate: NutritionEstimate =
        serde_json::from_value(value).map_err(ExtractionError::Shape)?;
    validate(&estimate)?;
    Ok(estimate)
}

fn validate(estimate: &NutritionEstimate) -> Result<(), ExtractionError> {
    if estimate.food_name.trim().is_empty() {
        return Err(ExtractionError::Invalid {
            field: "food_name",
            reason: "must not be empty",
        });
    }
    let amounts = [
        ("calories", estimate.calories),
        ("protein", estimate.protein),
        ("carbs", estimate.carbs),
        ("fat", estimate.fat),
    ];
    for (field, amount) in amounts {
        if !amount.is_finite() {
            return Err(ExtractionError::Invalid {
                field,
                reason: "must be a finite number",
            });
        }
        if amount < 0.0 {
            return Err(ExtractionError::Invalid {
                field,
                reason: "must not be negative",
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn eggs() -> NutritionEstimate {
        NutritionEstimate {
            food_name: "Eggs and toast".into(),
            calories: 320.0,
            protein: 14.0,
            carbs: 28.0,
            fat: 16.0,
            insight: None,
        }
    }

    #[test]
    fn extracts_object_surrounded_by_prose() {
        let raw = "Here you go:\n{\"food_name\":\"Eggs and toast\",\"calories\":320,\"protein\":14,\"carbs\":28,\"fat\":16}\nEnjoy!";
        assert_eq!(extract_estimate(raw).unwrap(), eggs());
    }

    #[test]
    fn extracts_object_inside_code_fence() {
        let raw = "```json\n{\n  \"food_name\": \"Salada\",\n  \"calories\": 150.5,\n  \"protein\": 3,\n  \"carbs\": 12,\n  \"fat\": 9,\n  \"insight\": \"Boa escolha para o déficit calórico.\"\n}\n```";
        let est = extract_estimate(raw).unwrap();
        assert_eq!(est.food_name, "Salada");
        assert_eq!(est.calories, 150.5);
        assert_eq!(est.insight.as_deref(), Some("Boa escolha para o déficit calórico."));
    }

    #[test]
    fn embedded_estimate_survives_prose_wrapping() {
        let mut original = eggs();
        original.insight = Some("Ótima fonte de proteína.".into());
        let raw = format!(
            "Claro! Segue a análise:\n{}\nQualquer dúvida, estou aqui.",
            serde_json::to_string(&original).unwrap()
        );
        assert_eq!(extract_estimate(&raw).unwrap(), original);
    }

    #[test]
    fn prose_without_braces_is_no_json() {
        let err = extract_estimate("Desculpe, não consegui analisar essa refeição.").unwrap_err();
        assert!(matches!(err, ExtractionError::NoJson));
    }

    #[test]
    fn unbalanced_braces_are_no_json() {
        assert!(matches!(
            extract_estimate("} backwards {").unwrap_err(),
            ExtractionError::NoJson
        ));
        assert!(matches!(
            extract_estimate("{\"food_name\": \"truncated").unwrap_err(),
            ExtractionError::NoJson
        ));
    }

    #[test]
    fn trailing_comma_is_a_syntax_error() {
        let err = extract_estimate("{\"food_name\":\"Salad\", \"calories\": 150,}").unwrap_err();
        assert!(matches!(err, ExtractionError::Syntax(_)));
    }

    #[test]
    fn two_objects_are_not_repaired() {
        let raw = "{\"food_name\":\"A\",\"calories\":1,\"protein\":1,\"carbs\":1,\"fat\":1} and also {\"food_name\":\"B\",\"calories\":2,\"protein\":2,\"carbs\":2,\"fat\":2}";
        assert!(matches!(
            extract_estimate(raw).unwrap_err(),
            ExtractionError::Syntax(_)
        ));
    }

    #[test]
    fn numeric_strings_are_rejected() {
        let raw = "{\"food_name\":\"Rice\",\"calories\":\"450\",\"protein\":8,\"carbs\":90,\"fat\":1}";
        assert!(matches!(
            extract_estimate(raw).unwrap_err(),
            ExtractionError::Shape(_)
        ));
    }

    #[test]
    fn missing_fields_are_not_defaulted() {
        let raw = "{\"food_name\":\"Rice\",\"calories\":450,\"protein\":8,\"carbs\":90}";
        let err = extract_estimate(raw).unwrap_err();
        assert!(matches!(err, ExtractionError::Shape(_)));
        assert!(err.to_string().contains("fat"));
    }

    #[test]
    fn empty_name_and_negative_amounts_are_invalid() {
        let raw = "{\"food_name\":\"  \",\"calories\":10,\"protein\":1,\"carbs\":1,\"fat\":1}";
        assert!(matches!(
            extract_estimate(raw).unwrap_err(),
            ExtractionError::Invalid { field: "food_name", .. }
        ));

        let raw = "{\"food_name\":\"Soup\",\"calories\":10,\"protein\":-1,\"carbs\":1,\"fat\":1}";
        assert!(matches!(
            extract_estimate(raw).unwrap_err(),
            ExtractionError::Invalid { field: "protein", .. }
        ));
    }

    #[test]
    fn extra_fields_are_ignored() {
        let raw = "{\"food_name\":\"Toast\",\"calories\":90,\"protein\":3,\"carbs\":15,\"fat\":1,\"fiber\":2}";
        let est = extract_estimate(raw).unwrap();
        assert_eq!(est.food_name, "Toast");
        assert_eq!(est.insight, None);
    }

    #[test]
    fn json_span_is_greedy() {
        assert_eq!(json_span("a {x} b {y} c"), Some("{x} b {y}"));
        assert_eq!(json_span("line\n{\n}\nend"), Some("{\n}"));
        assert_eq!(json_span("nothing here"), None);
    }
}
