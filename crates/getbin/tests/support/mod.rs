use std::collections::HashMap;
use std::io::{self, Cursor, Write};
use std::sync::{Arc, Mutex};

use bytes::Bytes;
use futures_util::stream;
use getbin::{BinarySpec, Getbin, LocalHintsSpec, OsConstraintSpec, Settings};
use getbin_fetch::{HttpBody, HttpClient};

/// Serves fixed bodies by URL and records every request.
#[derive(Clone, Default)]
pub struct MockClient {
    routes: Arc<Mutex<HashMap<String, Vec<u8>>>>,
    calls: Arc<Mutex<Vec<String>>>,
}

impl MockClient {
    pub fn route(self, url: &str, body: Vec<u8>) -> Self {
        self.routes.lock().unwrap().insert(url.to_string(), body);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

impl HttpClient for MockClient {
    type Error = io::Error;

    async fn get(
        &self,
        url: &str,
        _headers: &[(String, String)],
    ) -> Result<HttpBody<Self::Error>, Self::Error> {
        self.calls.lock().unwrap().push(url.to_string());
        let body = self.routes.lock().unwrap().get(url).cloned();
        match body {
            Some(body) => Ok(HttpBody {
                content_length: Some(body.len() as u64),
                stream: Box::pin(stream::iter(vec![Ok(Bytes::from(body))])),
            }),
            None => Err(io::Error::new(io::ErrorKind::NotFound, format!("404 Not Found for {url}"))),
        }
    }
}

/// A zip holding `entries` under one wrapping directory.
pub fn wrapped_zip(wrapper: &str, entries: &[(&str, &[u8])]) -> Vec<u8> {
    let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
    let options = zip::write::SimpleFileOptions::default()
        .compression_method(zip::CompressionMethod::Deflated)
        .unix_permissions(0o755);
    writer.add_directory(format!("{wrapper}/"), options).unwrap();
    for (name, data) in entries {
        writer.start_file(format!("{wrapper}/{name}"), options).unwrap();
        writer.write_all(data).unwrap();
    }
    writer.finish().unwrap().into_inner()
}

pub fn tool_zip() -> Vec<u8> {
    wrapped_zip("tool-1.0", &[("tool", b"\x7fELF tool"), ("README", b"read me")])
}

pub fn new_getbin(home: &std::path::Path, client: &MockClient) -> Getbin<MockClient> {
    Getbin::new(Settings::with_home(home), client.clone())
}

pub fn spec(name: &str, url: &str) -> BinarySpec {
    BinarySpec::new(name, url)
}

pub fn for_platform(mut spec: BinarySpec, platform: &str) -> BinarySpec {
    spec.os_constraint = Some(OsConstraintSpec {
        platform: Some(platform.to_string()),
        arch: None,
    });
    spec
}

pub fn with_hints(mut spec: BinarySpec, hints: LocalHintsSpec) -> BinarySpec {
    spec.local_hints = Some(hints);
    spec
}
