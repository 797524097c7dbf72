//! GTF (Gene Transfer Format / GFF2) reader.
//!
//! GTF uses a 9-column tab format with space-separated `key "value";`
//! attribute pairs. Features are grouped by `gene_id` and `transcript_id`
//! into [`Gene`] → [`Transcript`] → [`Exon`] models, from which
//! [`read_length_table`] derives one length per gene.
//!
//! Coordinates are converted from GTF's 1-based closed intervals to
//! 0-based half-open `[start, end)`. Plain and gzip-compressed files are
//! both accepted.

use std::collections::HashMap;
use std::io::BufRead;
use std::path::Path;

use coexnet_core::compress::{compression_error, open_text};
use coexnet_core::{CoexnetError, Result, Summarizable};
use coexnet_omics::{Exon, Gene, LengthPolicy, LengthTable, Transcript};
use tracing::{debug, info};

/// Parse a GTF file and return assembled gene models in first-seen order.
///
/// Malformed data lines are reported as [`CoexnetError::Annotation`].
pub fn parse_gtf(path: impl AsRef<Path>) -> Result<Vec<Gene>> {
    let path = path.as_ref();
    let reader = open_text(path)?;
    let genes = parse_gtf_reader(reader, &path.display().to_string())?;
    debug!(path = %path.display(), genes = genes.len(), "parsed GTF");
    Ok(genes)
}

/// Parse a GTF file and reduce it to a [`LengthTable`] under `policy`.
pub fn read_length_table(path: impl AsRef<Path>, policy: LengthPolicy) -> Result<LengthTable> {
    let path = path.as_ref();
    let genes = parse_gtf(path)?;
    let table = LengthTable::from_genes(&genes, policy);
    if table.is_empty() {
        return Err(CoexnetError::Annotation(format!(
            "{}: no gene with a positive length under {policy}",
            path.display()
        )));
    }
    info!(
        path = %path.display(),
        genes = genes.len(),
        with_length = table.len(),
        "{}",
        table.summary()
    );
    Ok(table)
}

/// Parse GTF text from any buffered reader. `source` names it in errors.
pub fn parse_gtf_reader<R: BufRead>(reader: R, source: &str) -> Result<Vec<Gene>> {
    let mut builder = GtfBuilder::default();

    for (line_num, line_result) in reader.lines().enumerate() {
        let line = line_result.map_err(|e| compression_error(Path::new(source), line_num + 1, e))?;
        let line = line.trim_end_matches(['\r', '\n']);

        if line.trim().is_empty() || line.starts_with('#') {
            continue;
        }

        let record = parse_gtf_line(line, line_num + 1, source)?;
        builder.add_record(record);
    }

    Ok(builder.build())
}

// ---------------------------------------------------------------------------
// Internal types and helpers
// ---------------------------------------------------------------------------

struct GtfRecord {
    seqid: String,
    feature_type: String,
    start: u64, // already 0-based
    end: u64,   // already half-open
    attributes: HashMap<String, String>,
}

struct GeneBuilder {
    gene_name: String,
    chrom: String,
    start: u64,
    end: u64,
}

struct TranscriptBuilder {
    gene_id: String,
    start: u64,
    end: u64,
    exons: Vec<Exon>,
}

#[derive(Default)]
struct GtfBuilder {
    genes: HashMap<String, GeneBuilder>,
    gene_order: Vec<String>,
    transcripts: HashMap<String, TranscriptBuilder>,
    transcript_order: Vec<String>,
}

impl GtfBuilder {
    fn add_record(&mut self, record: GtfRecord) {
        let gene_id = match record.attributes.get("gene_id") {
            Some(id) if !id.is_empty() => id.clone(),
            _ => return,
        };
        match record.feature_type.as_str() {
            "gene" => self.touch_gene(&gene_id, &record),
            "transcript" | "mRNA" => {
                self.touch_gene(&gene_id, &record);
                if let Some(tid) = record.attributes.get("transcript_id") {
                    self.touch_transcript(tid, &gene_id, &record);
                }
            }
            "exon" => {
                self.touch_gene(&gene_id, &record);
                if let Some(tid) = record.attributes.get("transcript_id") {
                    let tx = self.touch_transcript(tid, &gene_id, &record);
                    tx.exons.push(Exon {
                        start: record.start,
                        end: record.end,
                    });
                }
            }
            _ => {}
        }
    }

    /// Create the gene on first sight; later records widen its span.
    fn touch_gene(&mut self, gene_id: &str, record: &GtfRecord) {
        match self.genes.get_mut(gene_id) {
            Some(gene) => {
                gene.start = gene.start.min(record.start);
                gene.end = gene.end.max(record.end);
            }
            None => {
                let gene_name = record
                    .attributes
                    .get("gene_name")
                    .cloned()
                    .unwrap_or_else(|| gene_id.to_string());
                self.gene_order.push(gene_id.to_string());
                self.genes.insert(
                    gene_id.to_string(),
                    GeneBuilder {
                        gene_name,
                        chrom: record.seqid.clone(),
                        start: record.start,
                        end: record.end,
                    },
                );
            }
        }
    }

    fn touch_transcript(
        &mut self,
        transcript_id: &str,
        gene_id: &str,
        record: &GtfRecord,
    ) -> &mut TranscriptBuilder {
        if !self.transcripts.contains_key(transcript_id) {
            self.transcript_order.push(transcript_id.to_string());
        }
        let tx = self
            .transcripts
            .entry(transcript_id.to_string())
            .or_insert_with(|| TranscriptBuilder {
                gene_id: gene_id.to_string(),
                start: record.start,
                end: record.end,
                exons: Vec::new(),
            });
        tx.start = tx.start.min(record.start);
        tx.end = tx.end.max(record.end);
        tx
    }

    fn build(mut self) -> Vec<Gene> {
        let mut gene_transcripts: HashMap<String, Vec<Transcript>> = HashMap::new();
        for transcript_id in self.transcript_order {
            if let Some(mut tx) = self.transcripts.remove(&transcript_id) {
                tx.exons.sort_by_key(|e| (e.start, e.end));
                gene_transcripts
                    .entry(tx.gene_id)
                    .or_default()
                    .push(Transcript {
                        transcript_id,
                        start: tx.start,
                        end: tx.end,
                        exons: tx.exons,
                    });
            }
        }

        let mut genes = Vec::with_capacity(self.gene_order.len());
        for gene_id in self.gene_order {
            if let Some(gb) = self.genes.remove(&gene_id) {
                let transcripts = gene_transcripts.remove(&gene_id).unwrap_or_default();
                genes.push(Gene {
                    gene_id,
                    gene_name: gb.gene_name,
                    chrom: gb.chrom,
                    start: gb.start,
                    end: gb.end,
                    transcripts,
                });
            }
        }
        genes
    }
}

/// Parse a single GTF data line.
fn parse_gtf_line(line: &str, line_num: usize, source: &str) -> Result<GtfRecord> {
    let fields: Vec<&str> = line.split('\t').collect();
    if fields.len() != 9 {
        return Err(CoexnetError::Annotation(format!(
            "{source}: line {line_num}: expected 9 tab-separated columns, found {}",
            fields.len()
        )));
    }

    let parse_coord = |field: &str, what: &str| -> Result<u64> {
        field.trim().parse::<u64>().map_err(|_| {
            CoexnetError::Annotation(format!(
                "{source}: line {line_num}: invalid {what} '{field}'"
            ))
        })
    };

    // 1-based closed → 0-based half-open: only the start moves.
    let start_1 = parse_coord(fields[3], "start")?;
    let end = parse_coord(fields[4], "end")?;
    if start_1 == 0 || end < start_1 {
        return Err(CoexnetError::Annotation(format!(
            "{source}: line {line_num}: invalid interval {start_1}..{end}"
        )));
    }

    Ok(GtfRecord {
        seqid: fields[0].to_string(),
        feature_type: fields[2].to_string(),
        start: start_1 - 1,
        end,
        attributes: parse_gtf_attributes(fields[8]),
    })
}

/// Parse GTF attribute column.
///
/// GTF format: `gene_id "ENSG00000141510"; gene_name "TP53"; gene_type "protein_coding";`
/// Key-value pairs separated by `;`, values quoted with `"`.
fn parse_gtf_attributes(attr_str: &str) -> HashMap<String, String> {
    let mut attrs = HashMap::new();
    for pair in attr_str.split(';') {
        let pair = pair.trim();
        if pair.is_empty() {
            continue;
        }
        if let Some(space_pos) = pair.find(|c: char| c.is_whitespace()) {
            let key = pair[..space_pos].trim();
            let value = pair[space_pos..].trim();
            let value = value
                .strip_prefix('"')
                .and_then(|v| v.strip_suffix('"'))
                .unwrap_or(value);
            // Repeated keys (e.g. `tag`) keep their first value.
            attrs.entry(key.to_string()).or_insert_with(|| value.to_string());
        }
    }
    attrs
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const TOL: f64 = 1e-12;

    fn write_gtf(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::with_suffix(".gtf").unwrap();
        write!(file, "{}", content).unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn gtf_parse_simple() {
        let file = write_gtf(
            "#!genome-build GRCh38\n\
             chr1\tENSEMBL\tgene\t1000\t5000\t.\t+\t.\tgene_id \"ENSG001\"; gene_name \"TP53\"; gene_type \"protein_coding\";\n\
             chr1\tENSEMBL\ttranscript\t1000\t5000\t.\t+\t.\tgene_id \"ENSG001\"; transcript_id \"ENST001\";\n\
             chr1\tENSEMBL\texon\t1000\t1200\t.\t+\t.\tgene_id \"ENSG001\"; transcript_id \"ENST001\"; exon_number 1;\n\
             chr2\tENSEMBL\tgene\t2000\t3000\t.\t-\t.\tgene_id \"ENSG002\"; gene_name \"BRCA1\";\n\
             chr3\tENSEMBL\tgene\t5000\t8000\t.\t+\t.\tgene_id \"ENSG003\"; gene_name \"MYC\";\n",
        );

        let genes = parse_gtf(file.path()).unwrap();
        assert_eq!(genes.len(), 3);
        assert_eq!(genes[0].gene_name, "TP53");
        assert_eq!(genes[1].gene_name, "BRCA1");
        assert_eq!(genes[2].gene_name, "MYC");
        assert_eq!(genes[0].n_transcripts(), 1);
        assert_eq!(genes[0].transcripts[0].n_exons(), 1);
    }

    #[test]
    fn gtf_attributes_quoted() {
        let attrs = parse_gtf_attributes(
            "gene_id \"ENSG00000141510\"; gene_name \"TP53\"; tag \"basic\"; tag \"CCDS\";",
        );
        assert_eq!(attrs.get("gene_id").unwrap(), "ENSG00000141510");
        assert_eq!(attrs.get("gene_name").unwrap(), "TP53");
        assert_eq!(attrs.get("tag").unwrap(), "basic");
    }

    #[test]
    fn gtf_coordinates() {
        let file = write_gtf(
            "chr1\tENSEMBL\tgene\t1000\t5000\t.\t+\t.\tgene_id \"G1\";\n\
             chr1\tENSEMBL\texon\t1000\t1200\t.\t+\t.\tgene_id \"G1\"; transcript_id \"T1\";\n",
        );

        let genes = parse_gtf(file.path()).unwrap();
        // 1-based 1000 → 0-based 999; closed 5000 → half-open 5000
        assert_eq!(genes[0].start, 999);
        assert_eq!(genes[0].end, 5000);

        let exon = &genes[0].transcripts[0].exons[0];
        assert_eq!(exon.start, 999);
        assert_eq!(exon.end, 1200);
        assert_eq!(exon.len(), 201);
    }

    #[test]
    fn gtf_exons_without_transcript_lines() {
        let file = write_gtf(
            "chr1\tHAVANA\texon\t1\t100\t.\t+\t.\tgene_id \"G1\"; transcript_id \"T1\";\n\
             chr1\tHAVANA\texon\t201\t300\t.\t+\t.\tgene_id \"G1\"; transcript_id \"T1\";\n\
             chr1\tHAVANA\texon\t51\t150\t.\t+\t.\tgene_id \"G1\"; transcript_id \"T2\";\n",
        );
        let genes = parse_gtf(file.path()).unwrap();
        assert_eq!(genes.len(), 1);
        assert_eq!(genes[0].n_transcripts(), 2);
        assert_eq!((genes[0].start, genes[0].end), (0, 300));
        // union: [0,150) + [200,300)
        assert_eq!(genes[0].exon_union_length(), 250);
        assert_eq!(genes[0].longest_transcript_length(), 200);
    }

    #[test]
    fn gtf_length_table_policies() {
        let file = write_gtf(
            "chr1\tHAVANA\tgene\t1\t5000\t.\t+\t.\tgene_id \"ENSG1.3\";\n\
             chr1\tHAVANA\texon\t1\t1000\t.\t+\t.\tgene_id \"ENSG1.3\"; transcript_id \"T1\";\n\
             chr1\tHAVANA\texon\t4001\t5000\t.\t+\t.\tgene_id \"ENSG1.3\"; transcript_id \"T1\";\n\
             chr1\tHAVANA\tgene\t6001\t6500\t.\t+\t.\tgene_id \"ENSG2.1\";\n",
        );
        let union = read_length_table(file.path(), LengthPolicy::ExonUnion).unwrap();
        assert!((union.get("ENSG1.3").unwrap() - 2.0).abs() < TOL);
        assert!((union.get("ENSG1").unwrap() - 2.0).abs() < TOL);
        // no exons → no exonic length
        assert_eq!(union.get("ENSG2.1"), None);

        let span = read_length_table(file.path(), LengthPolicy::GeneSpan).unwrap();
        assert!((span.get("ENSG1.3").unwrap() - 5.0).abs() < TOL);
        assert!((span.get("ENSG2.1").unwrap() - 0.5).abs() < TOL);
    }

    #[test]
    fn gtf_repeated_gene_records_widen_span() {
        let file = write_gtf(
            "chrX\tHAVANA\tgene\t1001\t2000\t.\t+\t.\tgene_id \"G1\";\n\
             chrY\tHAVANA\tgene\t1\t1500\t.\t+\t.\tgene_id \"G1\";\n",
        );
        let genes = parse_gtf(file.path()).unwrap();
        assert_eq!(genes.len(), 1);
        assert_eq!(genes[0].span(), 2000);
    }

    #[test]
    fn gtf_gzip_input() {
        use flate2::write::GzEncoder;
        use flate2::Compression;

        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder
            .write_all(b"chr1\tX\texon\t1\t1000\t.\t+\t.\tgene_id \"G1\"; transcript_id \"T1\";\n")
            .unwrap();
        let mut file = NamedTempFile::with_suffix(".gtf.gz").unwrap();
        file.write_all(&encoder.finish().unwrap()).unwrap();
        file.flush().unwrap();

        let table = read_length_table(file.path(), LengthPolicy::ExonUnion).unwrap();
        assert!((table.get("G1").unwrap() - 1.0).abs() < TOL);
    }

    #[test]
    fn gtf_malformed_is_annotation_error() {
        let bad_columns = write_gtf("chr1\tX\tgene\t1\t100\n");
        assert!(matches!(parse_gtf(bad_columns.path()), Err(CoexnetError::Annotation(_))));

        let bad_coord = write_gtf("chr1\tX\tgene\tone\t100\t.\t+\t.\tgene_id \"G\";\n");
        assert!(matches!(parse_gtf(bad_coord.path()), Err(CoexnetError::Annotation(_))));

        let inverted = write_gtf("chr1\tX\tgene\t200\t100\t.\t+\t.\tgene_id \"G\";\n");
        assert!(matches!(parse_gtf(inverted.path()), Err(CoexnetError::Annotation(_))));
    }

    #[test]
    fn gtf_empty_table_is_annotation_error() {
        let file = write_gtf("#only a comment\n");
        assert!(matches!(
            read_length_table(file.path(), LengthPolicy::ExonUnion),
            Err(CoexnetError::Annotation(_))
        ));
    }

    #[test]
    fn gtf_missing_file_is_io_error() {
        assert!(matches!(parse_gtf("/nonexistent/annotation.gtf"), Err(CoexnetError::Io(_))));
    }
}
