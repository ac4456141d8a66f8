//! Named placeholder substitution for notification templates.
//!
//! Placeholders look like `{first_name}`; `{{` and `}}` stand for literal braces.

use thiserror::Error;

/// Template defects. These are configuration errors, never user errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TemplateFieldError {
    #[error("Template references '{{{field}}}' which is not supplied")]
    MissingField { field: String },

    #[error("Template has an unbalanced brace at byte {position}: {template:?}")]
    Malformed { template: String, position: usize },

    #[error("No templates configured for category '{category}'")]
    NoTemplates { category: &'static str },
}

enum Piece<'a> {
    Text(&'a str),
    Field(&'a str),
}

fn pieces(template: &str) -> Result<Vec<Piece<'_>>, TemplateFieldError> {
    let malformed = |position| TemplateFieldError::Malformed {
        template: template.to_owned(),
        position,
    };

    let mut result = Vec::new();
    let mut literal_start = 0;
    let bytes = template.as_bytes();
    let mut i = 0;

    while i < bytes.len() {
        match bytes[i] {
            b'{' if bytes.get(i + 1) == Some(&b'{') => {
                result.push(Piece::Text(&template[literal_start..=i]));
                i += 2;
                literal_start = i;
            }
            b'{' => {
                let close = template[i + 1..].find('}').ok_or_else(|| malformed(i))?;
                let name = &template[i + 1..i + 1 + close];
                if name.is_empty() || name.contains('{') {
                    return Err(malformed(i));
                }
                result.push(Piece::Text(&template[literal_start..i]));
                result.push(Piece::Field(name));
                i += close + 2;
                literal_start = i;
            }
            b'}' if bytes.get(i + 1) == Some(&b'}') => {
                result.push(Piece::Text(&template[literal_start..=i]));
                i += 2;
                literal_start = i;
            }
            b'}' => return Err(malformed(i)),
            _ => i += 1,
        }
    }
    result.push(Piece::Text(&template[literal_start..]));

    Ok(result)
}

/// Names of the placeholders a template uses, in order of appearance.
pub fn placeholders(template: &str) -> Result<Vec<&str>, TemplateFieldError> {
    Ok(pieces(template)?
        .into_iter()
        .filter_map(|piece| match piece {
            Piece::Field(name) => Some(name),
            Piece::Text(_) => None,
        })
        .collect())
}

/// Substitutes `fields` into `template`.
pub fn render(template: &str, fields: &[(&str, &str)]) -> Result<String, TemplateFieldError> {
    let mut out = String::with_capacity(template.len());
    for piece in pieces(template)? {
        match piece {
            Piece::Text(text) => out.push_str(text),
            Piece::Field(name) => {
                let (_, value) = fields
                    .iter()
                    .find(|(key, _)| *key == name)
                    .ok_or_else(|| TemplateFieldError::MissingField {
                        field: name.to_owned(),
                    })?;
                out.push_str(value);
            }
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_substitutes_fields() {
        let text = render(
            "{first_name} is read-only for {duration_text}.",
            &[("first_name", "Alex"), ("duration_text", "10 minutes")],
        )
        .unwrap();
        assert_eq!(text, "Alex is read-only for 10 minutes.");
    }

    #[test]
    fn test_render_missing_field() {
        let result = render("{first_name} for {duration_text}", &[("first_name", "Alex")]);
        assert_eq!(
            result,
            Err(TemplateFieldError::MissingField {
                field: "duration_text".to_owned()
            })
        );
    }

    #[test]
    fn test_render_ignores_unused_fields() {
        let text = render("Bye, {first_name}", &[("first_name", "Alex"), ("extra", "x")]).unwrap();
        assert_eq!(text, "Bye, Alex");
    }

    #[test]
    fn test_escaped_braces() {
        let text = render("{{literal}} {first_name}}}", &[("first_name", "A")]).unwrap();
        assert_eq!(text, "{literal} A}");
    }

    #[test]
    fn test_unbalanced_braces() {
        assert!(matches!(render("{first_name", &[]), Err(TemplateFieldError::Malformed { .. })));
        assert!(matches!(render("oops}", &[]), Err(TemplateFieldError::Malformed { .. })));
        assert!(matches!(render("{}", &[]), Err(TemplateFieldError::Malformed { .. })));
    }

    #[test]
    fn test_placeholders() {
        assert_eq!(
            placeholders("{first_name} ({duration_text}) {first_name}").unwrap(),
            vec!["first_name", "duration_text", "first_name"]
        );
        assert!(placeholders("no fields").unwrap().is_empty());
    }

    #[test]
    fn test_unicode_text_is_preserved() {
        let text = render("🚫 {first_name} — молчит", &[("first_name", "Алекс")]).unwrap();
        assert_eq!(text, "🚫 Алекс — молчит");
    }
}
