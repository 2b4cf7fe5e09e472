use bytes::Bytes;

/// A file handed to the upload queue.
#[derive(Debug, Clone)]
pub struct UploadRequest {
    /// Filename sent as the multipart part name.
    pub file_name: String,
    /// MIME type of the file.
    pub file_type: String,
    /// Raw file contents.
    pub data: Bytes,
}

impl UploadRequest {
    /// Create an upload request.
    pub fn new(
        file_name: impl Into<String>,
        file_type: impl Into<String>,
        data: impl Into<Bytes>,
    ) -> Self {
        Self {
            file_name: file_name.into(),
            file_type: file_type.into(),
            data: data.into(),
        }
    }

    /// File size in bytes.
    pub fn file_size(&self) -> u64 {
        self.data.len() as u64
    }
}
