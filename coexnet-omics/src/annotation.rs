//! Gene, transcript, and exon annotation types.
//!
//! A minimal gene → transcript → exon model carrying just enough
//! structure to derive a gene's transcribed length from GENCODE/Ensembl
//! style annotations.

use coexnet_core::Summarizable;

/// An exon within a transcript (0-based coordinates).
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Exon {
    /// 0-based start (inclusive).
    pub start: u64,
    /// 0-based end (exclusive).
    pub end: u64,
}

impl Exon {
    /// Length of the exon in bases.
    pub fn len(&self) -> u64 {
        self.end.saturating_sub(self.start)
    }

    /// Whether the exon has zero length.
    pub fn is_empty(&self) -> bool {
        self.end <= self.start
    }
}

/// A transcript and its exons.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Transcript {
    pub transcript_id: String,
    /// 0-based start (inclusive).
    pub start: u64,
    /// 0-based end (exclusive).
    pub end: u64,
    pub exons: Vec<Exon>,
}

impl Transcript {
    /// Number of exons.
    pub fn n_exons(&self) -> usize {
        self.exons.len()
    }

    /// Total exonic length (sum of individual exon lengths).
    ///
    /// Exons of one transcript do not overlap in well-formed annotations,
    /// so no merging is done here.
    pub fn exonic_length(&self) -> u64 {
        self.exons.iter().map(|e| e.len()).sum()
    }
}

/// A gene with its transcripts.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Gene {
    pub gene_id: String,
    pub gene_name: String,
    pub chrom: String,
    /// 0-based start (inclusive).
    pub start: u64,
    /// 0-based end (exclusive).
    pub end: u64,
    pub transcripts: Vec<Transcript>,
}

impl Gene {
    /// Length of the gene span in bases.
    pub fn span(&self) -> u64 {
        self.end.saturating_sub(self.start)
    }

    /// Number of transcripts.
    pub fn n_transcripts(&self) -> usize {
        self.transcripts.len()
    }

    /// Exonic length of the longest transcript, or 0 without transcripts.
    pub fn longest_transcript_length(&self) -> u64 {
        self.transcripts
            .iter()
            .map(Transcript::exonic_length)
            .max()
            .unwrap_or(0)
    }

    /// Bases covered by the union of every exon of every transcript.
    ///
    /// Overlapping and abutting exons are merged before summing, so a base
    /// shared by several isoforms counts once.
    pub fn exon_union_length(&self) -> u64 {
        let mut exons: Vec<(u64, u64)> = self
            .transcripts
            .iter()
            .flat_map(|t| t.exons.iter())
            .filter(|e| !e.is_empty())
            .map(|e| (e.start, e.end))
            .collect();
        exons.sort_unstable();

        let mut total = 0;
        let mut current: Option<(u64, u64)> = None;
        for (start, end) in exons {
            current = match current {
                Some((cs, ce)) if start <= ce => Some((cs, ce.max(end))),
                Some((cs, ce)) => {
                    total += ce - cs;
                    Some((start, end))
                }
                None => Some((start, end)),
            };
        }
        if let Some((cs, ce)) = current {
            total += ce - cs;
        }
        total
    }
}

impl Summarizable for Gene {
    fn summary(&self) -> String {
        format!(
            "Gene: {} ({}:{}-{}, {} transcripts)",
            self.gene_name,
            self.chrom,
            self.start,
            self.end,
            self.n_transcripts()
        )
    }
}
