use super::dto::UserNutritionContext;

pub const DEFAULT_AGE: &str = "30";
pub const DEFAULT_WEIGHT_KG: &str = "70";
pub const DEFAULT_OBJECTIVE: &str = "manter peso";

const BASIC_TEMPLATE: &str = "
Você é um nutricionista especialista. Analise o seguinte texto sobre uma refeição.

Retorne APENAS um JSON estruturado com os seguintes campos:
- food_name: nome resumido da refeição
- calories: valor numérico total de calorias
- protein: gramas de proteína (numérico)
- carbs: gramas de carboidratos (numérico)
- fat: gramas de gordura (numérico)

Texto da Refeição: \"{text}\"
";

const CONTEXT_TEMPLATE: &str = "
Você é um nutricionista especialista de elite. Analise o seguinte texto sobre uma refeição e o contexto do usuário abaixo.

CONTEXTO DO USUÁRIO:
- Idade: {age} anos
- Objetivo: {objective}
- Peso atual: {weight} kg

Analise a refeição e retorne APENAS um JSON estruturado com os seguintes campos:
- food_name: nome resumido e atraente da refeição
- calories: valor numérico total de calorias
- protein: gramas de proteína (numérico)
- carbs: gramas de carboidratos (numérico)
- fat: gramas de gordura (numérico)
- insight: Um conselho curto, motivador e técnico (máx 120 caracteres) correlacionando a refeição com o contexto do usuário.

Texto da Refeição: \"{text}\"
";

/// Builds the instruction sent to the model.
///
/// With no context the basic template is used. Any context, even one with
/// every field missing, selects the personalised template and fills the gaps
/// with the fixed defaults.
pub fn render_prompt(meal: &str, context: Option<&UserNutritionContext>) -> String {
    let Some(ctx) = context else {
        return render(BASIC_TEMPLATE, &[("text", meal)]);
    };

    let age = ctx
        .age
        .map(|a| a.to_string())
        .unwrap_or_else(|| DEFAULT_AGE.to_string());
    let weight = ctx
        .weight_kg
        .map(|w| w.to_string())
        .unwrap_or_else(|| DEFAULT_WEIGHT_KG.to_string());
    let objective = ctx
        .objective
        .map(|o| o.prompt_label())
        .unwrap_or(DEFAULT_OBJECTIVE);

    render(
        CONTEXT_TEMPLATE,
        &[
            ("text", meal),
            ("age", &age),
            ("weight", &weight),
            ("objective", objective),
        ],
    )
}

/// Single pass over `template`, replacing `{name}` with the matching value.
///
/// Only the template is scanned. Inserted values are copied as-is and never
/// revisited, so a value that looks like a placeholder stays literal.
/// Unknown names are left untouched.
fn render(template: &str, params: &[(&str, &str)]) -> String {
    let extra: usize = params.iter().map(|(_, v)| v.len()).sum();
    let mut out = String::with_capacity(template.len() + extra);
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        let Some(close) = after.find('}') else {
            out.push_str(&rest[open..]);
            return out;
        };
        let name = &after[..close];
        match params.iter().find(|(key, _)| *key == name) {
            Some((_, value)) => out.push_str(value),
            None => {
                out.push('{');
                out.push_str(name);
                out.push('}');
            }
        }
        rest = &after[close + 1..];
    }

    out.push_str(rest);
    out
}
