//! Gene length table used for TPM normalization.
//!
//! A [`LengthTable`] maps a gene identifier to its transcribed length in
//! kilobases. It is built once from annotation and never mutated.
//!
//! Ensembl/GENCODE identifiers carry a version suffix (`ENSG00000141510.17`)
//! that count tables and annotations do not always agree on. Lookups first
//! try the exact identifier, then the unversioned one.

use std::collections::HashMap;
use std::str::FromStr;

use coexnet_core::{CoexnetError, Result, Summarizable};

use crate::annotation::Gene;

/// How a gene's annotation records are reduced to a single length.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "kebab-case"))]
pub enum LengthPolicy {
    /// Bases covered by the union of all exons of all isoforms.
    #[default]
    ExonUnion,
    /// Exonic length of the longest isoform.
    LongestTranscript,
    /// Genomic span of the gene record(s), introns included.
    GeneSpan,
}

impl LengthPolicy {
    /// Length in bases of `gene` under this policy.
    pub fn bases(self, gene: &Gene) -> u64 {
        match self {
            LengthPolicy::ExonUnion => gene.exon_union_length(),
            LengthPolicy::LongestTranscript => gene.longest_transcript_length(),
            LengthPolicy::GeneSpan => gene.span(),
        }
    }
}

impl core::fmt::Display for LengthPolicy {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            LengthPolicy::ExonUnion => write!(f, "exon-union"),
            LengthPolicy::LongestTranscript => write!(f, "longest-transcript"),
            LengthPolicy::GeneSpan => write!(f, "gene-span"),
        }
    }
}

impl FromStr for LengthPolicy {
    type Err = CoexnetError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "exon-union" => Ok(LengthPolicy::ExonUnion),
            "longest-transcript" => Ok(LengthPolicy::LongestTranscript),
            "gene-span" => Ok(LengthPolicy::GeneSpan),
            other => Err(CoexnetError::InvalidInput(format!(
                "unknown length policy '{other}' (expected exon-union, longest-transcript or gene-span)"
            ))),
        }
    }
}

/// Strip an Ensembl-style `.N` version suffix, if present.
pub fn strip_version(id: &str) -> &str {
    match id.rsplit_once('.') {
        Some((base, version))
            if !base.is_empty()
                && !version.is_empty()
                && version.bytes().all(|b| b.is_ascii_digit()) =>
        {
            base
        }
        _ => id,
    }
}

/// Immutable gene identifier → length (kb) mapping.
#[derive(Debug, Clone, Default)]
pub struct LengthTable {
    lengths: HashMap<String, f64>,
    /// Unversioned id → kb; `None` marks a base id shared by versions of
    /// different length, which cannot be resolved.
    by_base: HashMap<String, Option<f64>>,
    policy: Option<LengthPolicy>,
}

impl LengthTable {
    /// Build a table from `(gene_id, length_kb)` pairs.
    ///
    /// Lengths must be finite and positive; a repeated identifier is an
    /// error because the table has no merge rule for raw pairs.
    pub fn from_lengths<I, S>(pairs: I) -> Result<Self>
    where
        I: IntoIterator<Item = (S, f64)>,
        S: Into<String>,
    {
        let mut table = LengthTable::default();
        for (id, kb) in pairs {
            let id = id.into();
            if !kb.is_finite() || kb <= 0.0 {
                return Err(CoexnetError::Annotation(format!(
                    "gene '{id}' has non-positive length {kb} kb"
                )));
            }
            if table.lengths.contains_key(&id) {
                return Err(CoexnetError::Annotation(format!(
                    "gene '{id}' listed more than once"
                )));
            }
            table.insert(id, kb);
        }
        Ok(table)
    }

    /// Build a table from gene models under `policy`.
    ///
    /// Records sharing a `gene_id` are merged first: their transcripts are
    /// pooled and their spans united, so the result does not depend on
    /// record order. Genes whose derived length is zero are left out.
    pub fn from_genes(genes: &[Gene], policy: LengthPolicy) -> Self {
        let mut order: Vec<&str> = Vec::new();
        let mut merged: HashMap<&str, Gene> = HashMap::new();
        for gene in genes {
            match merged.get_mut(gene.gene_id.as_str()) {
                Some(existing) => {
                    existing.start = existing.start.min(gene.start);
                    existing.end = existing.end.max(gene.end);
                    existing.transcripts.extend(gene.transcripts.iter().cloned());
                }
                None => {
                    order.push(&gene.gene_id);
                    merged.insert(&gene.gene_id, gene.clone());
                }
            }
        }

        let mut table = LengthTable {
            policy: Some(policy),
            ..LengthTable::default()
        };
        for id in order {
            let bases = policy.bases(&merged[id]);
            if bases > 0 {
                table.insert(id.to_string(), bases as f64 / 1000.0);
            }
        }
        table
    }

    fn insert(&mut self, id: String, kb: f64) {
        let base = strip_version(&id).to_string();
        self.by_base
            .entry(base)
            .and_modify(|slot| {
                if *slot != Some(kb) {
                    *slot = None;
                }
            })
            .or_insert(Some(kb));
        self.lengths.insert(id, kb);
    }

    /// Length in kb for `gene_id`, falling back to the unversioned id.
    pub fn get(&self, gene_id: &str) -> Option<f64> {
        if let Some(&kb) = self.lengths.get(gene_id) {
            return Some(kb);
        }
        let base = strip_version(gene_id);
        if let Some(&kb) = self.lengths.get(base) {
            return Some(kb);
        }
        self.by_base.get(base).copied().flatten()
    }

    /// Like [`get`](Self::get), but a miss is a [`CoexnetError::MissingAnnotation`].
    pub fn require(&self, gene_id: &str) -> Result<f64> {
        self.get(gene_id).ok_or_else(|| CoexnetError::MissingAnnotation {
            gene: gene_id.to_string(),
        })
    }

    /// Number of genes with a length.
    pub fn len(&self) -> usize {
        self.lengths.len()
    }

    /// Whether the table is empty.
    pub fn is_empty(&self) -> bool {
        self.lengths.is_empty()
    }

    /// The policy the table was derived with, if built from annotation.
    pub fn policy(&self) -> Option<LengthPolicy> {
        self.policy
    }
}

impl Summarizable for LengthTable {
    fn summary(&self) -> String {
        match self.policy {
            Some(p) => format!("LengthTable: {} genes ({p})", self.len()),
            None => format!("LengthTable: {} genes", self.len()),
        }
    }
}
