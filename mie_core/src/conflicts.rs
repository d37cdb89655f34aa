//! Semantic conflict detection between stored facts.
//!
//! Two valid facts of the same category whose embedding similarity clears the
//! threshold are reported as a potential conflict. Each unordered pair is
//! emitted once, using the lexicographic identifier order as the tie-break.

use crate::error::{MemoryError, Result};
use crate::reader::Reader;
use crate::storage::str_lit;
use crate::types::{Conflict, ConflictOptions, Fact};

const DEFAULT_THRESHOLD: f64 = 0.85;
const DEFAULT_LIMIT: usize = 10;

/// Per-fact candidate pool when scanning for neighbors.
const NEIGHBOR_POOL: usize = 10;

/// Scans same-category facts for near-duplicates via the semantic operator.
#[derive(Clone)]
pub struct ConflictDetector {
    reader: Reader,
}

impl ConflictDetector {
    pub fn new(reader: Reader) -> Self {
        Self { reader }
    }

    /// Scan stored facts for conflicting pairs.
    pub async fn detect_conflicts(&self, opts: ConflictOptions) -> Result<Vec<Conflict>> {
        if self.reader.embedder().is_none() {
            return Err(MemoryError::EmbeddingsDisabled);
        }

        let threshold = if opts.threshold > 0.0 && opts.threshold <= 1.0 {
            opts.threshold
        } else {
            DEFAULT_THRESHOLD
        };
        let limit = if opts.limit == 0 { DEFAULT_LIMIT } else { opts.limit };

        let facts = self.valid_facts(&opts.category)?;
        let fact_types = vec!["fact".to_string()];
        let mut conflicts: Vec<Conflict> = Vec::new();

        for fact in &facts {
            let neighbors = self
                .reader
                .semantic_search(&fact.content, &fact_types, NEIGHBOR_POOL)
                .await?;

            for neighbor in neighbors {
                // Emit each unordered pair once.
                if neighbor.id.as_str() <= fact.id.as_str() {
                    continue;
                }
                let similarity = 1.0 - neighbor.distance;
                if similarity < threshold {
                    continue;
                }
                let Some(other) = self.reader.get_fact(&neighbor.id)? else {
                    continue;
                };
                if !other.valid || other.category != fact.category {
                    continue;
                }
                conflicts.push(Conflict {
                    fact_a: fact.clone(),
                    fact_b: other,
                    similarity,
                });
                if conflicts.len() >= limit {
                    return Ok(conflicts);
                }
            }
        }

        Ok(conflicts)
    }

    /// Single-shot check run during interactive store flows: would this
    /// content collide with what is already stored?
    pub async fn check_new_fact_conflicts(
        &self,
        content: &str,
        category: &str,
    ) -> Result<Vec<Conflict>> {
        if self.reader.embedder().is_none() {
            return Err(MemoryError::EmbeddingsDisabled);
        }

        let fact_types = vec!["fact".to_string()];
        let neighbors = self
            .reader
            .semantic_search(content, &fact_types, NEIGHBOR_POOL)
            .await?;

        let candidate = Fact {
            id: String::new(),
            content: content.to_string(),
            category: category.to_string(),
            confidence: 0.0,
            source_agent: String::new(),
            source_conversation: String::new(),
            valid: true,
            created_at: 0,
            updated_at: 0,
        };

        let mut conflicts = Vec::new();
        for neighbor in neighbors {
            let similarity = 1.0 - neighbor.distance;
            if similarity < DEFAULT_THRESHOLD {
                continue;
            }
            let Some(other) = self.reader.get_fact(&neighbor.id)? else {
                continue;
            };
            if !other.valid {
                continue;
            }
            if !category.is_empty() && other.category != category {
                continue;
            }
            conflicts.push(Conflict {
                fact_a: candidate.clone(),
                fact_b: other,
                similarity,
            });
        }
        Ok(conflicts)
    }

    fn valid_facts(&self, category: &str) -> Result<Vec<Fact>> {
        let cols = crate::schema::node_columns("fact");
        let category_cond = if category.is_empty() {
            String::new()
        } else {
            format!(", category = {}", str_lit(category))
        };
        let rows = self.reader.substrate_query(&format!(
            "?[{cols}] := *mie_fact {{ {cols} }}, valid = true{category_cond} :order id"
        ))?;
        Ok(rows
            .rows
            .iter()
            .filter_map(|r| crate::reader::fact_from_row(r))
            .collect())
    }
}
