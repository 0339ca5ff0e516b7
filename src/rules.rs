use std::fmt;
use std::path::Path;

use anyhow::Context;
use serde::{Deserialize, Serialize};

/// One upstream association rule. Read and displayed, never mined here.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AssociationRule {
    pub antecedents: Vec<String>,
    pub consequents: Vec<String>,
    pub support: f64,
    pub confidence: f64,
    pub lift: Option<f64>,
}

impl fmt::Display for AssociationRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "If [{}] --> [{}]: support={:.2}, confidence={:.2}",
            self.antecedents.join(", "),
            self.consequents.join(", "),
            self.support,
            self.confidence
        )?;
        match self.lift {
            Some(lift) => write!(f, ", lift={lift:.2}"),
            None => Ok(()),
        }
    }
}

#[derive(Debug, Deserialize)]
struct RuleRow {
    antecedents: String,
    consequents: String,
    support: f64,
    confidence: f64,
    #[serde(default)]
    lift: Option<f64>,
}

pub fn read_rules(path: &Path) -> anyhow::Result<Vec<AssociationRule>> {
    let reader = csv::Reader::from_path(path)
        .with_context(|| format!("failed to open {}", path.display()))?;
    parse_rules(reader)
}

pub fn parse_rules<R: std::io::Read>(
    mut reader: csv::Reader<R>,
) -> anyhow::Result<Vec<AssociationRule>> {
    let mut rules = Vec::new();

    for (index, result) in reader.deserialize::<RuleRow>().enumerate() {
        let row = result.with_context(|| format!("failed to parse rule row {}", index + 1))?;
        rules.push(AssociationRule {
            antecedents: parse_item_set(&row.antecedents),
            consequents: parse_item_set(&row.consequents),
            support: row.support,
            confidence: row.confidence,
            lift: row.lift,
        });
    }

    Ok(rules)
}

/// Accepts `frozenset({'a', 'b'})`, `{'a'}` or a bare comma list.
pub fn parse_item_set(value: &str) -> Vec<String> {
    let mut inner = value.trim();
    if let Some(rest) = inner.strip_prefix("frozenset(") {
        inner = rest.strip_suffix(')').unwrap_or(rest);
    }
    let inner = inner.trim_start_matches('{').trim_end_matches('}');

    inner
        .split(',')
        .map(|item| item.trim().trim_matches(|c| c == '\'' || c == '"'))
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}
