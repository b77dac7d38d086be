//! The remote API collaborator.

use async_trait::async_trait;
use bytes::Bytes;
use serde_json::Value;
use strata_graph::{FileKey, Graph};
use strata_view::View;

use crate::error::RemoteError;

/// Server-side graph storage.
///
/// Push and pull bodies use the nested graph wire shape. A push result has
/// the same shape as the pushed graph with every leaf replaced by a status
/// object such as `{"statusCode": 200}` or
/// `{"statusCode": 403, "name": "NoWriteRightError"}`.
#[async_trait]
pub trait RemoteApi: Send + Sync {
    async fn push(&self, body: &Graph) -> Result<Value, RemoteError>;

    async fn pull(&self, view: &View) -> Result<Graph, RemoteError>;

    /// Send one file. `progress` is called with the fraction sent so far.
    async fn upload(
        &self,
        request: &UploadRequest,
        progress: &(dyn Fn(f64) + Send + Sync),
    ) -> Result<(), RemoteError>;
}

/// Upload instructions returned for an accepted file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadTicket {
    pub file: FileKey,
    pub urls: Vec<String>,
    pub upload_id: Option<String>,
    /// Part size requested when the file was attached.
    pub part_size: Option<u64>,
}

/// One file transfer: a ticket paired with its blob.
#[derive(Debug, Clone, PartialEq)]
pub struct UploadRequest {
    pub ticket: UploadTicket,
    pub blob: Bytes,
}

impl UploadRequest {
    pub fn new(ticket: UploadTicket, blob: Bytes) -> Self {
        Self { ticket, blob }
    }

    /// More than one URL means a multipart upload, one part per URL.
    pub fn is_multipart(&self) -> bool {
        self.ticket.urls.len() > 1
    }

    /// `(url, part)` pairs. A single URL gets the whole blob; otherwise the
    /// blob is cut into parts of `part_size` bytes (or evenly across the
    /// URLs when no size was requested) and the last URL takes the rest.
    /// Parts past the end of the blob are empty.
    pub fn parts(&self) -> Vec<(&str, Bytes)> {
        let urls = &self.ticket.urls;
        if !self.is_multipart() {
            return urls
                .first()
                .map(|url| vec![(url.as_str(), self.blob.clone())])
                .unwrap_or_default();
        }

        let len = self.blob.len();
        let part_size = self
            .ticket
            .part_size
            .filter(|size| *size > 0)
            .map(|size| usize::try_from(size).unwrap_or(usize::MAX))
            .unwrap_or_else(|| len.div_ceil(urls.len()).max(1));

        let last = urls.len() - 1;
        urls.iter()
            .enumerate()
            .map(|(i, url)| {
                let start = i.saturating_mul(part_size).min(len);
                let end = if i == last {
                    len
                } else {
                    (i + 1).saturating_mul(part_size).min(len)
                };
                (url.as_str(), self.blob.slice(start..end))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(urls: &[&str], part_size: Option<u64>, blob: &'static [u8]) -> UploadRequest {
        UploadRequest::new(
            UploadTicket {
                file: FileKey::new("n1", "f"),
                urls: urls.iter().map(|u| u.to_string()).collect(),
                upload_id: None,
                part_size,
            },
            Bytes::from_static(blob),
        )
    }

    #[test]
    fn single_url_sends_whole_blob() {
        let req = request(&["https://up/1"], None, b"hello");
        assert!(!req.is_multipart());
        assert_eq!(req.parts(), vec![("https://up/1", Bytes::from_static(b"hello"))]);
    }

    #[test]
    fn multipart_splits_evenly() {
        let req = request(&["u1", "u2", "u3"], None, b"abcdefg");
        assert!(req.is_multipart());
        let parts: Vec<_> = req.parts().into_iter().map(|(_, b)| b).collect();
        assert_eq!(parts, vec![
            Bytes::from_static(b"abc"),
            Bytes::from_static(b"def"),
            Bytes::from_static(b"g"),
        ]);
    }

    #[test]
    fn multipart_honors_part_size() {
        let req = request(&["u1", "u2"], Some(2), b"abcdef");
        let parts: Vec<_> = req.parts().into_iter().map(|(_, b)| b).collect();
        assert_eq!(parts, vec![Bytes::from_static(b"ab"), Bytes::from_static(b"cdef")]);
    }

    #[test]
    fn oversized_part_size_puts_everything_in_the_first_part() {
        let req = request(&["u1", "u2", "u3"], Some(u64::MAX), b"abcdef");
        let parts: Vec<_> = req.parts().into_iter().map(|(_, b)| b).collect();
        assert_eq!(parts, vec![
            Bytes::from_static(b"abcdef"),
            Bytes::new(),
            Bytes::new(),
        ]);
    }
}
