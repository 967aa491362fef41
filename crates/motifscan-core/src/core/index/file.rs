use super::{DescriptorStore, IndexError, OccurrenceRecord};
use crate::core::models::identifiers::StructureIdentifier;
use memmap2::Mmap;
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

// Offsets-table file layout (little endian):
//   magic "MSIX", version u8, flags u8, reserved u16
//   structure table: count u32, then per entry: len u8, utf8 bytes
//   operator table:  count u32, then per entry: len u8, utf8 bytes
//   entry count u64
//   entries sorted by key: key u64, offset u64, len u32
// Data file: concatenated bin payloads. Uncompressed payload: repeated
//   records: structure_index u32, operator_index u16, count u32,
//   residue_pair u32 * count.
const MAGIC: &[u8; 4] = b"MSIX";
const VERSION: u8 = 1;
const FLAG_COMPRESSED: u8 = 0b0000_0001;

/// Memory-mapped, file-backed inverted index.
///
/// Bins are stored uncompressed by default so that O(100) arbitrary bins can
/// be selected within low tens of milliseconds against a warm cache;
/// compression is an explicit write-time trade-off, never the default for
/// query-serving deployments. The mapping is immutable, so `select` takes
/// `&self` and concurrent readers need no locking.
pub struct FileIndex {
    data: Mmap,
    entries: Vec<BinEntry>,
    structures: Vec<StructureIdentifier>,
    operators: Vec<String>,
    compressed: bool,
}

#[derive(Debug, Clone, Copy)]
struct BinEntry {
    key: u64,
    offset: u64,
    len: u32,
}

impl FileIndex {
    pub fn open(
        offsets_path: impl AsRef<Path>,
        data_path: impl AsRef<Path>,
    ) -> Result<Self, IndexError> {
        let raw = std::fs::read(offsets_path)?;
        let mut reader = SliceReader::new(&raw);

        let magic = reader.take(4).map_err(|_| truncated_header())?;
        if magic != MAGIC {
            return Err(IndexError::InvalidHeader("bad magic".to_string()));
        }
        let version = reader.u8().map_err(|_| truncated_header())?;
        if version != VERSION {
            return Err(IndexError::InvalidHeader(format!(
                "unsupported version {version}"
            )));
        }
        let flags = reader.u8().map_err(|_| truncated_header())?;
        let _reserved = reader.u16().map_err(|_| truncated_header())?;
        let compressed = flags & FLAG_COMPRESSED != 0;
        #[cfg(not(feature = "compression"))]
        if compressed {
            return Err(IndexError::InvalidHeader(
                "index was written compressed; rebuild without compression or enable the \
                 `compression` feature"
                    .to_string(),
            ));
        }

        let structures = read_string_table(&mut reader)?
            .into_iter()
            .map(|s| StructureIdentifier::new(&s))
            .collect();
        let operators = read_string_table(&mut reader)?;

        let entry_count = reader.u64().map_err(|_| truncated_header())? as usize;
        let mut entries = Vec::with_capacity(entry_count);
        let mut previous_key = None;
        for _ in 0..entry_count {
            let key = reader.u64().map_err(|_| truncated_header())?;
            let offset = reader.u64().map_err(|_| truncated_header())?;
            let len = reader.u32().map_err(|_| truncated_header())?;
            if previous_key.is_some_and(|previous| previous >= key) {
                return Err(IndexError::InvalidHeader(
                    "offset entries are not strictly ascending".to_string(),
                ));
            }
            previous_key = Some(key);
            entries.push(BinEntry { key, offset, len });
        }

        let file = File::open(data_path)?;
        // The data file is never mutated after a build completes.
        let data = unsafe { Mmap::map(&file)? };

        Ok(Self {
            data,
            entries,
            structures,
            operators,
            compressed,
        })
    }

    fn bin_bytes(&self, entry: BinEntry) ->
        Result<std::borrow::Cow<'_, [u8]>, IndexError>
    {
        let start = entry.offset as usize;
        let end = start + entry.len as usize;
        if end > self.data.len() {
            return Err(IndexError::Corruption {
                key: entry.key,
                reason: "bin extends past end of data file".to_string(),
            });
        }
        let raw = &self.data[start..end];
        if self.compressed {
            #[cfg(feature = "compression")]
            {
                use std::io::Read;
                let mut decoded = Vec::new();
                flate2::read::ZlibDecoder::new(raw)
                    .read_to_end(&mut decoded)
                    .map_err(|e| IndexError::Corruption {
                        key: entry.key,
                        reason: format!("bin decompression failed: {e}"),
                    })?;
                return Ok(std::borrow::Cow::Owned(decoded));
            }
            #[cfg(not(feature = "compression"))]
            unreachable!("compressed index rejected at open time");
        }
        Ok(std::borrow::Cow::Borrowed(raw))
    }

    fn parse_bin(&self, key: u64, payload: &[u8]) -> Result<Vec<OccurrenceRecord>, IndexError> {
        let corrupt = |reason: &str| IndexError::Corruption {
            key,
            reason: reason.to_string(),
        };
        let mut reader = SliceReader::new(payload);
        let mut records = Vec::new();
        while !reader.is_empty() {
            let structure_index = reader.u32().map_err(|_| corrupt("truncated record"))? as usize;
            let operator_index = reader.u16().map_err(|_| corrupt("truncated record"))? as usize;
            let count = reader.u32().map_err(|_| corrupt("truncated record"))? as usize;
            let structure_id = self
                .structures
                .get(structure_index)
                .ok_or_else(|| corrupt("structure index outside manifest"))?
                .clone();
            let operator_id = self
                .operators
                .get(operator_index)
                .ok_or_else(|| corrupt("operator index outside manifest"))?
                .clone();
            let mut residue_pairs = Vec::with_capacity(count);
            for _ in 0..count {
                residue_pairs.push(reader.u32().map_err(|_| corrupt("truncated residue pair"))?);
            }
            records.push(OccurrenceRecord {
                structure_id,
                operator_id,
                residue_pairs,
            });
        }
        Ok(records)
    }
}

impl DescriptorStore for FileIndex {
    fn select(&self, key: u64) -> Result<Vec<OccurrenceRecord>, IndexError> {
        let Ok(position) = self.entries.binary_search_by_key(&key, |entry| entry.key) else {
            return Ok(Vec::new());
        };
        let entry = self.entries[position];
        let payload = self.bin_bytes(entry)?;
        self.parse_bin(key, &payload)
    }

    fn known_descriptors(&self) -> Result<Vec<u64>, IndexError> {
        Ok(self.entries.iter().map(|entry| entry.key).collect())
    }
}

/// Sequential writer used by index-build collaborators. Bins must be added in
/// strictly ascending key order; visibility is all-or-nothing at `finish`.
pub struct FileIndexWriter {
    offsets_file: BufWriter<File>,
    data_file: BufWriter<File>,
    structures: Vec<StructureIdentifier>,
    structure_indices: HashMap<StructureIdentifier, u32>,
    operators: Vec<String>,
    operator_indices: HashMap<String, u16>,
    entries: Vec<BinEntry>,
    data_offset: u64,
    compressed: bool,
}

impl FileIndexWriter {
    pub fn create(
        offsets_path: impl AsRef<Path>,
        data_path: impl AsRef<Path>,
    ) -> Result<Self, IndexError> {
        Self::with_compression(offsets_path, data_path, false)
    }

    /// Compression trades disk space for a decode cost measured at roughly
    /// 20-30x slower bin reads; it must be an explicit choice.
    pub fn with_compression(
        offsets_path: impl AsRef<Path>,
        data_path: impl AsRef<Path>,
        compressed: bool,
    ) -> Result<Self, IndexError> {
        #[cfg(not(feature = "compression"))]
        if compressed {
            return Err(IndexError::InvalidHeader(
                "compression requested but the `compression` feature is disabled".to_string(),
            ));
        }
        Ok(Self {
            offsets_file: BufWriter::new(File::create(offsets_path)?),
            data_file: BufWriter::new(File::create(data_path)?),
            structures: Vec::new(),
            structure_indices: HashMap::new(),
            operators: Vec::new(),
            operator_indices: HashMap::new(),
            entries: Vec::new(),
            data_offset: 0,
            compressed,
        })
    }

    pub fn add_bin(&mut self, key: u64, records: &[OccurrenceRecord]) -> Result<(), IndexError> {
        if self.entries.last().is_some_and(|last| last.key >= key) {
            return Err(IndexError::InvalidHeader(
                "bins must be added in strictly ascending key order".to_string(),
            ));
        }

        let mut payload = Vec::new();
        for record in records {
            let structure_index = self.intern_structure(&record.structure_id)?;
            let operator_index = self.intern_operator(&record.operator_id)?;
            payload.extend_from_slice(&structure_index.to_le_bytes());
            payload.extend_from_slice(&operator_index.to_le_bytes());
            payload.extend_from_slice(&(record.residue_pairs.len() as u32).to_le_bytes());
            for &pair in &record.residue_pairs {
                payload.extend_from_slice(&pair.to_le_bytes());
            }
        }

        #[cfg(feature = "compression")]
        let payload = if self.compressed {
            use std::io::Write as _;
            let mut encoder =
                flate2::write::ZlibEncoder::new(Vec::new(), flate2::Compression::default());
            encoder.write_all(&payload)?;
            encoder.finish()?
        } else {
            payload
        };

        self.data_file.write_all(&payload)?;
        self.entries.push(BinEntry {
            key,
            offset: self.data_offset,
            len: payload.len() as u32,
        });
        self.data_offset += payload.len() as u64;
        Ok(())
    }

    pub fn finish(mut self) -> Result<(), IndexError> {
        let mut flags = 0u8;
        if self.compressed {
            flags |= FLAG_COMPRESSED;
        }
        self.offsets_file.write_all(MAGIC)?;
        self.offsets_file.write_all(&[VERSION, flags, 0, 0])?;

        write_string_table(
            &mut self.offsets_file,
            self.structures.iter().map(|s| s.as_str()),
            self.structures.len(),
        )?;
        write_string_table(
            &mut self.offsets_file,
            self.operators.iter().map(|s| s.as_str()),
            self.operators.len(),
        )?;

        self.offsets_file
            .write_all(&(self.entries.len() as u64).to_le_bytes())?;
        for entry in &self.entries {
            self.offsets_file.write_all(&entry.key.to_le_bytes())?;
            self.offsets_file.write_all(&entry.offset.to_le_bytes())?;
            self.offsets_file.write_all(&entry.len.to_le_bytes())?;
        }

        self.data_file.flush()?;
        self.offsets_file.flush()?;
        Ok(())
    }

    fn intern_structure(&mut self, id: &StructureIdentifier) -> Result<u32, IndexError> {
        if let Some(&index) = self.structure_indices.get(id) {
            return Ok(index);
        }
        let index = self.structures.len() as u32;
        self.structures.push(id.clone());
        self.structure_indices.insert(id.clone(), index);
        Ok(index)
    }

    fn intern_operator(&mut self, operator: &str) -> Result<u16, IndexError> {
        if let Some(&index) = self.operator_indices.get(operator) {
            return Ok(index);
        }
        if self.operators.len() > u16::MAX as usize {
            return Err(IndexError::InvalidHeader(
                "operator manifest exceeds 65536 entries".to_string(),
            ));
        }
        let index = self.operators.len() as u16;
        self.operators.push(operator.to_string());
        self.operator_indices.insert(operator.to_string(), index);
        Ok(index)
    }
}

fn truncated_header() -> IndexError {
    IndexError::InvalidHeader("truncated header".to_string())
}

fn read_string_table(reader: &mut SliceReader<'_>) -> Result<Vec<String>, IndexError> {
    let count = reader.u32().map_err(|_| truncated_header())? as usize;
    let mut table = Vec::with_capacity(count);
    for _ in 0..count {
        let len = reader.u8().map_err(|_| truncated_header())? as usize;
        let bytes = reader.take(len).map_err(|_| truncated_header())?;
        let value = std::str::from_utf8(bytes)
            .map_err(|_| IndexError::InvalidHeader("non-utf8 manifest entry".to_string()))?;
        table.push(value.to_string());
    }
    Ok(table)
}

fn write_string_table<'a>(
    writer: &mut impl Write,
    values: impl Iterator<Item = &'a str>,
    count: usize,
) -> Result<(), IndexError> {
    writer.write_all(&(count as u32).to_le_bytes())?;
    for value in values {
        let bytes = value.as_bytes();
        if bytes.len() > u8::MAX as usize {
            return Err(IndexError::InvalidHeader(format!(
                "manifest entry too long: {value}"
            )));
        }
        writer.write_all(&[bytes.len() as u8])?;
        writer.write_all(bytes)?;
    }
    Ok(())
}

struct SliceReader<'a> {
    bytes: &'a [u8],
}

struct Truncated;

impl<'a> SliceReader<'a> {
    fn new(bytes: &'a [u8]) -> Self {
        Self { bytes }
    }

    fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8], Truncated> {
        if self.bytes.len() < n {
            return Err(Truncated);
        }
        let (head, tail) = self.bytes.split_at(n);
        self.bytes = tail;
        Ok(head)
    }

    fn u8(&mut self) -> Result<u8, Truncated> {
        Ok(self.take(1)?[0])
    }

    fn u16(&mut self) -> Result<u16, Truncated> {
        Ok(u16::from_le_bytes(self.take(2)?.try_into().unwrap()))
    }

    fn u32(&mut self) -> Result<u32, Truncated> {
        Ok(u32::from_le_bytes(self.take(4)?.try_into().unwrap()))
    }

    fn u64(&mut self) -> Result<u64, Truncated> {
        Ok(u64::from_le_bytes(self.take(8)?.try_into().unwrap()))
    }
}
