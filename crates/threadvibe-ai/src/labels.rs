//! Label vocabulary loading from a HuggingFace model config.
//!
//! Classification exports carry their label names in `config.json`
//! under `id2label`, keyed by stringified class index. The vocabulary
//! order must match the model's logit order.

use std::collections::HashMap;
use std::path::Path;

use serde::Deserialize;

#[derive(Deserialize)]
struct ModelConfig {
    #[serde(default)]
    id2label: HashMap<String, String>,
}

/// Read the ordered label vocabulary from a model's `config.json`.
pub fn load_labels(config_path: &Path) -> anyhow::Result<Vec<String>> {
    let raw = std::fs::read_to_string(config_path)?;
    labels_from_json(&raw)
}

fn labels_from_json(raw: &str) -> anyhow::Result<Vec<String>> {
    let config: ModelConfig = serde_json::from_str(raw)?;
    anyhow::ensure!(
        !config.id2label.is_empty(),
        "config.json has no id2label mapping"
    );

    let mut entries = config
        .id2label
        .into_iter()
        .map(|(id, label)| {
            let idx: usize = id
                .parse()
                .map_err(|_| anyhow::anyhow!("non-numeric label id {id:?}"))?;
            Ok((idx, label))
        })
        .collect::<anyhow::Result<Vec<_>>>()?;
    entries.sort_by_key(|(idx, _)| *idx);

    for (expected, (idx, _)) in entries.iter().enumerate() {
        anyhow::ensure!(
            *idx == expected,
            "label ids are not contiguous from 0: found {idx}"
        );
    }

    Ok(entries.into_iter().map(|(_, label)| label).collect())
}
