use std::io::Write;

use anyhow::{Context, Result, bail};
use flate2::Compression;
use flate2::write::DeflateEncoder;

const LOCAL_HEADER_SIGNATURE: u32 = 0x0403_4b50;
const CENTRAL_HEADER_SIGNATURE: u32 = 0x0201_4b50;
const END_OF_CENTRAL_SIGNATURE: u32 = 0x0605_4b50;
const VERSION_NEEDED: u16 = 20;
const METHOD_STORED: u16 = 0;
const METHOD_DEFLATED: u16 = 8;
// 1980-01-01 00:00:00, so identical inputs give identical archives.
const DOS_TIME: u16 = 0;
const DOS_DATE: u16 = 0x0021;

/// Minimal ZIP writer: one local header per entry followed by the central
/// directory on [`PackageWriter::finish`]. No ZIP64, so entries and offsets
/// stay below 4 GiB.
pub(super) struct PackageWriter<W: Write> {
    out: W,
    offset: u32,
    central: Vec<u8>,
    entries: u16,
}

struct EncodedEntry {
    method: u16,
    crc: u32,
    compressed: Vec<u8>,
    uncompressed_len: u32,
}

impl<W: Write> PackageWriter<W> {
    pub(super) fn new(out: W) -> Self {
        Self {
            out,
            offset: 0,
            central: Vec::new(),
            entries: 0,
        }
    }

    pub(super) fn add(&mut self, name: &str, data: &[u8]) -> Result<()> {
        if self.entries == u16::MAX {
            bail!("package already holds {} entries", u16::MAX);
        }

        let entry = encode(data).with_context(|| format!("failed to compress {name}"))?;
        let name_len = u16::try_from(name.len())
            .with_context(|| format!("entry name too long: {name}"))?;
        let compressed_len = u32::try_from(entry.compressed.len())
            .with_context(|| format!("entry too large: {name}"))?;

        let mut header = Vec::with_capacity(30 + name.len());
        put_u32(&mut header, LOCAL_HEADER_SIGNATURE);
        put_u16(&mut header, VERSION_NEEDED);
        put_u16(&mut header, 0);
        put_u16(&mut header, entry.method);
        put_u16(&mut header, DOS_TIME);
        put_u16(&mut header, DOS_DATE);
        put_u32(&mut header, entry.crc);
        put_u32(&mut header, compressed_len);
        put_u32(&mut header, entry.uncompressed_len);
        put_u16(&mut header, name_len);
        put_u16(&mut header, 0);
        header.extend_from_slice(name.as_bytes());

        put_u32(&mut self.central, CENTRAL_HEADER_SIGNATURE);
        put_u16(&mut self.central, VERSION_NEEDED);
        put_u16(&mut self.central, VERSION_NEEDED);
        put_u16(&mut self.central, 0);
        put_u16(&mut self.central, entry.method);
        put_u16(&mut self.central, DOS_TIME);
        put_u16(&mut self.central, DOS_DATE);
        put_u32(&mut self.central, entry.crc);
        put_u32(&mut self.central, compressed_len);
        put_u32(&mut self.central, entry.uncompressed_len);
        put_u16(&mut self.central, name_len);
        put_u16(&mut self.central, 0);
        put_u16(&mut self.central, 0);
        put_u16(&mut self.central, 0);
        put_u16(&mut self.central, 0);
        put_u32(&mut self.central, 0);
        put_u32(&mut self.central, self.offset);
        self.central.extend_from_slice(name.as_bytes());

        self.out
            .write_all(&header)
            .and_then(|()| self.out.write_all(&entry.compressed))
            .with_context(|| format!("failed to write package entry {name}"))?;

        let written = u32::try_from(header.len())
            .ok()
            .and_then(|len| len.checked_add(compressed_len))
            .and_then(|len| self.offset.checked_add(len));
        self.offset = written.context("package exceeds 4 GiB")?;
        self.entries += 1;
        Ok(())
    }

    pub(super) fn finish(mut self) -> Result<W> {
        let central_len =
            u32::try_from(self.central.len()).context("central directory too large")?;

        let mut trailer = Vec::with_capacity(22);
        put_u32(&mut trailer, END_OF_CENTRAL_SIGNATURE);
        put_u16(&mut trailer, 0);
        put_u16(&mut trailer, 0);
        put_u16(&mut trailer, self.entries);
        put_u16(&mut trailer, self.entries);
        put_u32(&mut trailer, central_len);
        put_u32(&mut trailer, self.offset);
        put_u16(&mut trailer, 0);

        self.out
            .write_all(&self.central)
            .and_then(|()| self.out.write_all(&trailer))
            .and_then(|()| self.out.flush())
            .context("failed to write package directory")?;
        Ok(self.out)
    }
}

fn encode(data: &[u8]) -> Result<EncodedEntry> {
    let uncompressed_len = u32::try_from(data.len()).context("entry exceeds 4 GiB")?;

    let mut hasher = crc32fast::Hasher::new();
    hasher.update(data);
    let crc = hasher.finalize();

    let mut encoder = DeflateEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data)?;
    let deflated = encoder.finish()?;

    let (method, compressed) = if deflated.len() < data.len() {
        (METHOD_DEFLATED, deflated)
    } else {
        (METHOD_STORED, data.to_vec())
    };

    Ok(EncodedEntry {
        method,
        crc,
        compressed,
        uncompressed_len,
    })
}

fn put_u16(buf: &mut Vec<u8>, value: u16) {
    buf.extend_from_slice(&value.to_le_bytes());
}

fn put_u32(buf: &mut Vec<u8>, value: u32) {
    buf.extend_from_slice(&value.to_le_bytes());
}
