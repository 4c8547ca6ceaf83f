use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

// Duplicated scene items come in as "Pine-1", "Pine-2", ...; external tools
// expect the "Pine", "Pine.001", "Pine.002" convention instead. The table
// keeps both directions so callers can translate names round trip.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NameMap {
    pub raw_to_external: BTreeMap<String, String>,
    pub external_to_raw: BTreeMap<String, String>,
}

impl NameMap {
    pub fn build<'a>(ids: impl IntoIterator<Item = &'a str>) -> Self {
        let ids: Vec<&str> = ids.into_iter().collect();
        let id_set: HashSet<&str> = ids.iter().copied().collect();

        let mut groups: BTreeMap<String, Vec<&str>> = BTreeMap::new();
        let mut plain = Vec::new();
        for &id in &ids {
            match numbered_base(id) {
                Some(base) => groups.entry(base.to_string()).or_default().push(id),
                None => plain.push(id),
            }
        }

        let mut map = NameMap::default();
        for id in plain {
            map.insert(id, id);
        }
        for (base, mut variants) in groups {
            variants.sort_unstable();
            variants.dedup();
            // When the bare base is itself an id, every variant gets a
            // numbered suffix, counting from zero.
            let base_taken = id_set.contains(base.as_str());
            for (pos, id) in variants.iter().copied().enumerate() {
                let external = if base_taken {
                    format!("{base}.{pos:03}")
                } else if pos == 0 {
                    base.clone()
                } else {
                    format!("{base}.{pos:03}")
                };
                map.insert(id, &external);
            }
        }
        map
    }

    pub fn external_name(&self, raw: &str) -> Option<&str> {
        self.raw_to_external.get(raw).map(String::as_str)
    }

    pub fn raw_name(&self, external: &str) -> Option<&str> {
        self.external_to_raw.get(external).map(String::as_str)
    }

    fn insert(&mut self, raw: &str, external: &str) {
        self.raw_to_external
            .insert(raw.to_string(), external.to_string());
        self.external_to_raw
            .insert(external.to_string(), raw.to_string());
    }
}

fn numbered_base(id: &str) -> Option<&str> {
    let (base, digits) = id.rsplit_once('-')?;
    if base.is_empty() || digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    Some(base)
}
