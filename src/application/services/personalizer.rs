use std::collections::HashMap;

use crate::domain::models::{Attributes, MessageTemplate};

const TOKEN_OPEN: &str = "{{";
const TOKEN_CLOSE: &str = "}}";

/// Substitutes `{{field}}` tokens with recipient attributes.
///
/// Keys match case-insensitively. When two attribute keys differ only by case
/// the all-lowercase key wins, so the normalized `name` and `email` built for
/// every recipient take precedence over raw fields such as `Email`; among
/// other variants the first in map order wins. Unknown tokens stay in the
/// output as written. Values are inserted verbatim, without HTML escaping, and are not
/// scanned for further tokens.
pub fn render(template: &MessageTemplate, attributes: &Attributes) -> MessageTemplate {
    let mut lookup: HashMap<String, &str> = HashMap::with_capacity(attributes.len());
    for (key, value) in attributes {
        let folded = key.to_lowercase();
        if folded == *key {
            lookup.insert(folded, value.as_str());
        } else {
            lookup.entry(folded).or_insert(value.as_str());
        }
    }

    MessageTemplate {
        subject: substitute(&template.subject, &lookup),
        body: substitute(&template.body, &lookup),
    }
}

fn substitute(text: &str, lookup: &HashMap<String, &str>) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;

    while let Some(start) = rest.find(TOKEN_OPEN) {
        out.push_str(&rest[..start]);
        let after_open = &rest[start + TOKEN_OPEN.len()..];

        let replacement = after_open.find(TOKEN_CLOSE).and_then(|end| {
            let key = &after_open[..end];
            lookup
                .get(&key.to_lowercase())
                .map(|value| (*value, start + TOKEN_OPEN.len() + end + TOKEN_CLOSE.len()))
        });

        match replacement {
            Some((value, consumed)) => {
                out.push_str(value);
                rest = &rest[consumed..];
            }
            None => {
                // Not a known token: keep one brace and rescan, so "{{{name}}"
                // still resolves the inner token.
                out.push('{');
                rest = &rest[start + 1..];
            }
        }
    }

    out.push_str(rest);
    out
}
