// Segment Assembler: byte-exact concatenation of downloaded segments.
//
// MPEG-TS packets are self-delimiting, so the container is just the segment
// payloads back to back with nothing in between.

use std::path::{Path, PathBuf};

use tokio::fs::File;
use tokio::io::{AsyncWrite, AsyncWriteExt, BufWriter};
use tracing::{debug, info};

use crate::hls::scheduler::RetrievedSegment;

/// The concatenated segments, ready for transcoding.
#[derive(Debug, Clone)]
pub struct AssembledContainer {
    pub path: PathBuf,
    pub size: u64,
    pub segment_count: usize,
}

#[derive(Debug, thiserror::Error)]
#[error("failed to assemble container at {}: {source}", path.display())]
pub struct AssemblyError {
    /// The file that could not be read or written
    pub path: PathBuf,
    #[source]
    pub source: std::io::Error,
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SegmentAssembler;

impl SegmentAssembler {
    pub fn new() -> Self {
        Self
    }

    /// Append each file in `sources` to `writer`, in order. Returns bytes copied.
    pub async fn concat_into<'a, W, I>(
        &self,
        sources: I,
        writer: &mut W,
    ) -> Result<u64, AssemblyError>
    where
        W: AsyncWrite + Unpin,
        I: IntoIterator<Item = &'a Path>,
    {
        let mut total = 0u64;
        for source in sources {
            let mut input = File::open(source).await.map_err(|e| AssemblyError {
                path: source.to_path_buf(),
                source: e,
            })?;
            let copied = tokio::io::copy(&mut input, writer)
                .await
                .map_err(|e| AssemblyError {
                    path: source.to_path_buf(),
                    source: e,
                })?;
            debug!(path = %source.display(), bytes = copied, "Appended segment");
            total += copied;
        }
        Ok(total)
    }

    /// Write the segments, in the given order, into a fresh file at `destination`.
    pub async fn assemble(
        &self,
        segments: &[RetrievedSegment],
        destination: &Path,
    ) -> Result<AssembledContainer, AssemblyError> {
        let write_error = |source| AssemblyError {
            path: destination.to_path_buf(),
            source,
        };

        let file = File::create(destination).await.map_err(write_error)?;
        let mut writer = BufWriter::new(file);
        let size = self
            .concat_into(segments.iter().map(|s| s.path.as_path()), &mut writer)
            .await?;
        writer.flush().await.map_err(write_error)?;

        info!(
            path = %destination.display(),
            segments = segments.len(),
            bytes = size,
            "Assembled container"
        );
        Ok(AssembledContainer {
            path: destination.to_path_buf(),
            size,
            segment_count: segments.len(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hls::playlist::SegmentRef;
    use url::Url;

    async fn write_segments(dir: &Path, payloads: &[&[u8]]) -> Vec<RetrievedSegment> {
        let mut segments = Vec::new();
        for (index, payload) in payloads.iter().enumerate() {
            let path = dir.join(format!("segment_{index}.ts"));
            tokio::fs::write(&path, payload).await.unwrap();
            segments.push(RetrievedSegment {
                segment: SegmentRef {
                    index,
                    url: Url::parse(&format!("http://h/{index}.ts")).unwrap(),
                },
                path,
                size: payload.len() as u64,
            });
        }
        segments
    }

    #[tokio::test]
    async fn concatenates_in_order_including_empty_segments() {
        let dir = tempfile::tempdir().unwrap();
        let segments = write_segments(dir.path(), &[b"AAA", b"", b"BB"]).await;

        let out = dir.path().join("out.ts");
        let container = SegmentAssembler::new()
            .assemble(&segments, &out)
            .await
            .unwrap();

        assert_eq!(tokio::fs::read(&out).await.unwrap(), b"AAABB");
        assert_eq!(container.size, 5);
        assert_eq!(container.segment_count, 3);
    }

    #[tokio::test]
    async fn concat_into_memory_writer() {
        let dir = tempfile::tempdir().unwrap();
        let segments = write_segments(dir.path(), &[b"\x47\x00", b"\x47\x01\x02"]).await;

        let mut buffer: Vec<u8> = Vec::new();
        let copied = SegmentAssembler::new()
            .concat_into(segments.iter().rev().map(|s| s.path.as_path()), &mut buffer)
            .await
            .unwrap();

        assert_eq!(copied, 5);
        assert_eq!(buffer, b"\x47\x01\x02\x47\x00");
    }

    #[tokio::test]
    async fn missing_segment_file_names_the_path() {
        let dir = tempfile::tempdir().unwrap();
        let mut segments = write_segments(dir.path(), &[b"A"]).await;
        segments[0].path = dir.path().join("gone.ts");

        let err = SegmentAssembler::new()
            .assemble(&segments, &dir.path().join("out.ts"))
            .await
            .unwrap_err();
        assert_eq!(err.path, dir.path().join("gone.ts"));
    }

    #[tokio::test]
    async fn existing_container_is_overwritten() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("out.ts");
        tokio::fs::write(&out, b"stale data from an older run").await.unwrap();
        let segments = write_segments(dir.path(), &[b"new"]).await;

        SegmentAssembler::new().assemble(&segments, &out).await.unwrap();
        assert_eq!(tokio::fs::read(&out).await.unwrap(), b"new");
    }
}
