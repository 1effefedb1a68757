//! CSV interchange files between the assembler phases and the loader.
//!
//! Layout per source, under the configured data directory:
//!
//! ```text
//! {kg_data}/{source}/nodes/{kind}.csv            Phase 1 node tables
//! {kg_data}/{source}/ids/{kind}.csv              Phase 1 srcID → itemID, every record
//! {kg_data}/{source}/pending/{from}_{to}.csv     Phase 1 links, endpoints maybe source-native
//! {kg_data}/{source}/relationships/{from}_{to}.csv  Phase 2 output, generated IDs only
//! ```
//!
//! Node tables carry a header row equal to [`EntityKind::fields`] and hold one
//! row per `itemID`. Several source records can share an `itemID` (aliases of
//! one canonical name), so the id table keeps a row per distinct `srcID`.
//! Phase 2 never holds a node table in memory: [`IdMap`] streams the id table
//! into one string arena with a sorted index.

use std::collections::HashSet;
use std::fs::{self, File};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::edges::RelationshipType;
use crate::errors::{AimkgError, Result};
use crate::ids::ItemId;
use crate::nodes::{EntityKind, NodeRow};

/// Directory layout of one source's interchange files.
#[derive(Debug, Clone)]
pub struct SourceLayout {
    root: PathBuf,
}

impl SourceLayout {
    pub fn new(data_dir: &Path, source: &str) -> Self {
        Self {
            root: data_dir.join(source),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn node_table(&self, kind: EntityKind) -> PathBuf {
        self.root
            .join("nodes")
            .join(format!("{}.csv", kind.key_prefix()))
    }

    pub fn pending(&self, rel: RelationshipType) -> PathBuf {
        self.root
            .join("pending")
            .join(format!("{}.csv", rel.file_stem()))
    }

    pub fn id_table(&self, kind: EntityKind) -> PathBuf {
        self.root
            .join("ids")
            .join(format!("{}.csv", kind.key_prefix()))
    }

    pub fn relationships(&self, rel: RelationshipType) -> PathBuf {
        self.root
            .join("relationships")
            .join(format!("{}.csv", rel.file_stem()))
    }

    pub fn create_dirs(&self) -> Result<()> {
        for sub in ["nodes", "ids", "pending", "relationships"] {
            fs::create_dir_all(self.root.join(sub))?;
        }
        Ok(())
    }
}

// ── node tables ─────────────────────────────────────────────────────────────

const ID_TABLE_HEADER: [&str; 2] = ["srcID", "itemID"];

/// Writes one node table and its id table. Node rows are skipped when their
/// `itemID` was already written; the `srcID → itemID` pair is recorded either
/// way.
pub struct NodeTableWriter {
    kind: EntityKind,
    writer: csv::Writer<File>,
    ids: csv::Writer<File>,
    seen: HashSet<ItemId>,
    seen_src: HashSet<String>,
}

impl NodeTableWriter {
    pub fn create(layout: &SourceLayout, kind: EntityKind) -> Result<Self> {
        let mut writer = csv::Writer::from_path(layout.node_table(kind))?;
        writer.write_record(kind.fields())?;
        let mut ids = csv::Writer::from_path(layout.id_table(kind))?;
        ids.write_record(ID_TABLE_HEADER)?;
        Ok(Self {
            kind,
            writer,
            ids,
            seen: HashSet::new(),
            seen_src: HashSet::new(),
        })
    }

    /// Returns `false` when the node row was a duplicate and not written.
    pub fn write(&mut self, row: &NodeRow) -> Result<bool> {
        if row.kind != self.kind {
            return Err(AimkgError::Validation(format!(
                "{} row written to the {} table",
                row.kind, self.kind
            )));
        }
        let id = row.item_id()?;
        let src = row.src_id();
        if !src.is_empty() && self.seen_src.insert(src.to_owned()) {
            self.ids.write_record([src, id.to_string().as_str()])?;
        }
        if !self.seen.insert(id) {
            return Ok(false);
        }
        self.writer.write_record(&row.values)?;
        Ok(true)
    }

    pub fn len(&self) -> usize {
        self.seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }

    pub fn finish(mut self) -> Result<usize> {
        self.writer.flush()?;
        self.ids.flush()?;
        Ok(self.seen.len())
    }
}

/// Read a node table. A missing file is an empty table.
pub fn read_node_table(path: &Path, kind: EntityKind) -> Result<Vec<NodeRow>> {
    if !path.exists() {
        return Ok(Vec::new());
    }
    let mut reader = csv::Reader::from_path(path)?;
    check_header(reader.headers()?, kind, path)?;
    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        rows.push(NodeRow::new(
            kind,
            record.iter().map(str::to_string).collect(),
        )?);
    }
    Ok(rows)
}

fn check_header(header: &csv::StringRecord, kind: EntityKind, path: &Path) -> Result<()> {
    let expected = kind.fields();
    if header.iter().ne(expected.iter().copied()) {
        return Err(AimkgError::Validation(format!(
            "{} has header {:?}, expected {:?}",
            path.display(),
            header.iter().collect::<Vec<_>>(),
            expected
        )));
    }
    Ok(())
}

// ── pending links ───────────────────────────────────────────────────────────

/// One endpoint of a Phase 1 link: either already a generated ID, or a
/// source-native ID still to be resolved in Phase 2.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EndpointRef {
    Id(ItemId),
    Src(String),
}

impl EndpointRef {
    fn split(&self) -> (&'static str, String) {
        match self {
            EndpointRef::Id(id) => ("id", id.to_string()),
            EndpointRef::Src(src) => ("src", src.clone()),
        }
    }

    fn join(kind: &str, key: String) -> Result<Self> {
        match kind {
            "id" => Ok(EndpointRef::Id(key.parse()?)),
            "src" => Ok(EndpointRef::Src(key)),
            other => Err(AimkgError::Validation(format!(
                "unknown endpoint reference kind '{other}'"
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingLink {
    pub from: EndpointRef,
    pub to: EndpointRef,
}

#[derive(Debug, Serialize, Deserialize)]
struct PendingRecord {
    from_ref: String,
    from_key: String,
    to_ref: String,
    to_key: String,
}

pub struct PendingWriter {
    writer: csv::Writer<File>,
    written: usize,
}

impl PendingWriter {
    pub fn create(path: &Path) -> Result<Self> {
        Ok(Self {
            writer: csv::Writer::from_path(path)?,
            written: 0,
        })
    }

    pub fn write(&mut self, link: &PendingLink) -> Result<()> {
        let (from_ref, from_key) = link.from.split();
        let (to_ref, to_key) = link.to.split();
        self.writer.serialize(PendingRecord {
            from_ref: from_ref.to_string(),
            from_key,
            to_ref: to_ref.to_string(),
            to_key,
        })?;
        self.written += 1;
        Ok(())
    }

    pub fn finish(mut self) -> Result<usize> {
        // serialize() only emits the header with the first record.
        if self.written == 0 {
            self.writer
                .write_record(["from_ref", "from_key", "to_ref", "to_key"])?;
        }
        self.writer.flush()?;
        Ok(self.written)
    }
}

/// Stream the links of a pending file. A missing file yields no links.
pub fn for_each_pending<F>(path: &Path, mut f: F) -> Result<()>
where
    F: FnMut(PendingLink) -> Result<()>,
{
    if !path.exists() {
        return Ok(());
    }
    let mut reader = csv::Reader::from_path(path)?;
    for record in reader.deserialize::<PendingRecord>() {
        let record = record?;
        f(PendingLink {
            from: EndpointRef::join(&record.from_ref, record.from_key)?,
            to: EndpointRef::join(&record.to_ref, record.to_key)?,
        })?;
    }
    Ok(())
}

// ── resolved relationships ──────────────────────────────────────────────────

#[derive(Debug, Serialize, Deserialize)]
struct RelationshipRecord {
    #[serde(rename = "startID")]
    start: ItemId,
    #[serde(rename = "endID")]
    end: ItemId,
}

pub struct RelationshipWriter {
    writer: csv::Writer<File>,
    seen: HashSet<(ItemId, ItemId)>,
}

impl RelationshipWriter {
    pub fn create(path: &Path) -> Result<Self> {
        let mut writer = csv::Writer::from_path(path)?;
        writer.write_record(["startID", "endID"])?;
        Ok(Self {
            writer,
            seen: HashSet::new(),
        })
    }

    /// Returns `false` for a pair already written.
    pub fn write(&mut self, start: ItemId, end: ItemId) -> Result<bool> {
        if !self.seen.insert((start, end)) {
            return Ok(false);
        }
        self.writer.write_record([start.to_string(), end.to_string()])?;
        Ok(true)
    }

    pub fn finish(mut self) -> Result<usize> {
        self.writer.flush()?;
        Ok(self.seen.len())
    }
}

pub fn read_relationships(path: &Path) -> Result<Vec<(ItemId, ItemId)>> {
    if !path.exists() {
        return Ok(Vec::new());
    }
    let mut reader = csv::Reader::from_path(path)?;
    reader
        .deserialize::<RelationshipRecord>()
        .map(|r| r.map(|rec| (rec.start, rec.end)).map_err(AimkgError::from))
        .collect()
}

// ── id maps ─────────────────────────────────────────────────────────────────

/// Compact `srcID → itemID` lookup built from a persisted id table.
///
/// All source IDs live in one `String` arena; `entries` holds
/// `(offset, len, id)` sorted by the referenced key, so memory is the key bytes
/// plus 24 bytes per row and lookups are a binary search.
#[derive(Debug, Default)]
pub struct IdMap {
    arena: String,
    entries: Vec<(usize, usize, ItemId)>,
}

impl IdMap {
    /// Stream an id table. A missing file yields an empty map. When a source
    /// ID repeats, the first row wins.
    pub fn from_id_table(path: &Path, kind: EntityKind) -> Result<Self> {
        let mut map = IdMap::default();
        if !path.exists() {
            return Ok(map);
        }
        let mut reader = csv::Reader::from_path(path)?;
        let header = reader.headers()?;
        if header.iter().ne(ID_TABLE_HEADER) {
            return Err(AimkgError::Validation(format!(
                "{} has header {:?}, expected the {} id table header {:?}",
                path.display(),
                header.iter().collect::<Vec<_>>(),
                kind,
                ID_TABLE_HEADER
            )));
        }
        let mut record = csv::StringRecord::new();
        while reader.read_record(&mut record)? {
            let (Some(src), Some(id)) = (record.get(0), record.get(1)) else {
                continue;
            };
            map.push(src, id.parse()?);
        }
        map.seal();
        debug!(kind = %kind, entries = map.len(), "built id map");
        Ok(map)
    }

    fn push(&mut self, src: &str, id: ItemId) {
        let offset = self.arena.len();
        self.arena.push_str(src);
        self.entries.push((offset, src.len(), id));
    }

    fn key(&self, entry: &(usize, usize, ItemId)) -> &str {
        &self.arena[entry.0..entry.0 + entry.1]
    }

    fn seal(&mut self) {
        let mut entries = std::mem::take(&mut self.entries);
        // Stable sort keeps file order among equal keys, so dedup keeps the first.
        entries.sort_by(|a, b| self.key(a).cmp(self.key(b)));
        entries.dedup_by(|b, a| self.key(a) == self.key(b));
        self.entries = entries;
    }

    pub fn get(&self, src: &str) -> Option<ItemId> {
        self.entries
            .binary_search_by(|e| self.key(e).cmp(src))
            .ok()
            .map(|i| self.entries[i].2)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
