//! JSON Schema generation for the public data model

use anyhow::{Context, Result};
use beacon_core::AttentionSnapshot;
use schema::{
    AttentionBundle, AttentionCounts, AttentionEvent, AttentionFilter, AttentionItem,
    FocusModeSettings, NewAttentionItem,
};
use schemars::schema::RootSchema;
use schemars::schema_for;
use std::fs;
use std::path::Path;

fn schemas() -> Vec<(&'static str, RootSchema)> {
    vec![
        ("new-attention-item", schema_for!(NewAttentionItem)),
        ("attention-item", schema_for!(AttentionItem)),
        ("attention-bundle", schema_for!(AttentionBundle)),
        ("focus-mode-settings", schema_for!(FocusModeSettings)),
        ("attention-counts", schema_for!(AttentionCounts)),
        ("attention-filter", schema_for!(AttentionFilter)),
        ("attention-event", schema_for!(AttentionEvent)),
        ("attention-snapshot", schema_for!(AttentionSnapshot)),
    ]
}

pub fn run(out: &Path) -> Result<()> {
    fs::create_dir_all(out).with_context(|| format!("creating {}", out.display()))?;

    for (name, schema) in schemas() {
        let path = out.join(format!("{name}.schema.json"));
        let json = serde_json::to_string_pretty(&schema)?;
        fs::write(&path, json + "\n").with_context(|| format!("writing {}", path.display()))?;
        println!("Generated {}", path.display());
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_titles_match_types() {
        for (name, schema) in schemas() {
            let title = schema
                .schema
                .metadata
                .as_ref()
                .and_then(|m| m.title.clone())
                .unwrap_or_default();
            let flat: String = name.split('-').collect();
            assert_eq!(title.to_lowercase(), flat, "schema {name}");
        }
    }
}
