//! Dataset resolution: streamed access when the server supports it, local
//! materialization otherwise.
//!
//! Remote references are first probed at their `.dds` endpoint. A server
//! that answers with a DAP dataset descriptor is read in place; anything
//! else is downloaded once per job into the job's `inputs/` directory.
//! Either way the variable handle is re-chunked with [`plan_chunks`] so
//! reads stay within the element budget.

use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use indexmap::IndexMap;
use netcdf_io::{Attributes, DatasetSource, LazyArray, NetCdfDataset, NetCdfResult};
use reqwest::blocking::Client;
use reqwest::StatusCode;
use tracing::{debug, info, instrument};

use crate::chunking::{plan_chunks, DEFAULT_MAX_CHUNK_ELEMENTS};
use crate::config::BridgeConfig;
use crate::error::{BridgeError, Result};
use crate::job::JobContext;

/// Decides whether a remote URL can be read without downloading it.
pub trait StreamProbe: Send + Sync {
    /// Any failure means "not streamable".
    fn is_streamable(&self, url: &str) -> bool;
}

/// Opens a dataset by local path or URL.
pub trait DatasetOpener: Send + Sync {
    fn open(&self, location: &str) -> NetCdfResult<Box<dyn DatasetSource>>;
}

/// Copies a remote file to a local path.
pub trait Fetcher: Send + Sync {
    /// Returns the number of bytes written.
    fn fetch(&self, url: &str, dest: &Path) -> Result<u64>;
}

/// Probe of the OPeNDAP dataset descriptor endpoint.
pub struct HttpProbe {
    client: Client,
}

impl HttpProbe {
    pub fn new(timeout: Duration) -> reqwest::Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { client })
    }
}

impl StreamProbe for HttpProbe {
    fn is_streamable(&self, url: &str) -> bool {
        let dds = format!("{}.dds", url);
        match self.client.get(&dds).send() {
            Ok(response) if response.status() == StatusCode::OK => match response.text() {
                Ok(body) => body.starts_with("Dataset"),
                Err(e) => {
                    debug!(url = %dds, error = %e, "Unreadable descriptor body");
                    false
                }
            },
            Ok(response) => {
                debug!(url = %dds, status = %response.status(), "Descriptor not available");
                false
            }
            Err(e) => {
                debug!(url = %dds, error = %e, "Descriptor probe failed");
                false
            }
        }
    }
}

/// A probe that never reports a URL as streamable.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoProbe;

impl StreamProbe for NoProbe {
    fn is_streamable(&self, _url: &str) -> bool {
        false
    }
}

/// Opens datasets with the NetCDF library, which also reads DAP URLs.
#[derive(Debug, Default, Clone, Copy)]
pub struct NetCdfOpener;

impl DatasetOpener for NetCdfOpener {
    fn open(&self, location: &str) -> NetCdfResult<Box<dyn DatasetSource>> {
        Ok(Box::new(NetCdfDataset::open(location)?))
    }
}

/// Downloads over HTTP.
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(timeout: Duration) -> reqwest::Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .connect_timeout(Duration::from_secs(30))
            .build()?;
        Ok(Self { client })
    }
}

impl Fetcher for HttpFetcher {
    fn fetch(&self, url: &str, dest: &Path) -> Result<u64> {
        let mut response = self
            .client
            .get(url)
            .send()
            .and_then(|r| r.error_for_status())
            .map_err(|e| BridgeError::resolution(url, e))?;

        let mut file = File::create(dest).map_err(|e| BridgeError::resolution(url, e))?;
        let bytes = response
            .copy_to(&mut file)
            .map_err(|e| BridgeError::resolution(url, e))?;

        info!(url = %url, path = %dest.display(), bytes, "Downloaded input");
        Ok(bytes)
    }
}

/// How a resolved dataset is read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccessMode {
    /// Read on demand from the remote server.
    Streamed,

    /// Read from a local file, downloaded or given as a path.
    Materialized { path: PathBuf },
}

/// A lazily-read variable ready to be passed to an indicator.
#[derive(Debug)]
pub struct ResolvedDataset {
    pub reference: String,
    pub variable: LazyArray,

    /// Global attributes of the source dataset.
    pub attrs: Attributes,

    pub access: AccessMode,
    pub chunks: IndexMap<String, usize>,
}

enum Reference<'a> {
    Remote(&'a str),
    Local(PathBuf),
}

impl<'a> Reference<'a> {
    fn parse(reference: &'a str) -> Self {
        if reference.starts_with("http://") || reference.starts_with("https://") {
            Self::Remote(reference)
        } else if let Some(path) = reference.strip_prefix("file://") {
            Self::Local(PathBuf::from(path))
        } else {
            Self::Local(PathBuf::from(reference))
        }
    }
}

/// Whether a reference points to a remote server.
pub fn is_remote(reference: &str) -> bool {
    matches!(Reference::parse(reference), Reference::Remote(_))
}

/// Turns file references into chunked variable handles.
pub struct DatasetResolver {
    probe: Arc<dyn StreamProbe>,
    opener: Arc<dyn DatasetOpener>,
    fetcher: Arc<dyn Fetcher>,
    max_chunk_elements: usize,
}

impl DatasetResolver {
    pub fn new(
        probe: Arc<dyn StreamProbe>,
        opener: Arc<dyn DatasetOpener>,
        fetcher: Arc<dyn Fetcher>,
    ) -> Self {
        Self {
            probe,
            opener,
            fetcher,
            max_chunk_elements: DEFAULT_MAX_CHUNK_ELEMENTS,
        }
    }

    /// HTTP probe and downloads, NetCDF opener.
    pub fn from_config(config: &BridgeConfig) -> reqwest::Result<Self> {
        let probe = HttpProbe::new(Duration::from_secs(config.probe_timeout_secs))?;
        let fetcher = HttpFetcher::new(Duration::from_secs(config.download_timeout_secs))?;
        Ok(Self::new(Arc::new(probe), Arc::new(NetCdfOpener), Arc::new(fetcher))
            .with_max_chunk_elements(config.max_chunk_elements))
    }

    pub fn with_max_chunk_elements(mut self, max_chunk_elements: usize) -> Self {
        self.max_chunk_elements = max_chunk_elements;
        self
    }

    /// Resolve `reference` and open `variable` from it.
    #[instrument(skip(self, job), fields(job_id = %job.id()))]
    pub fn resolve(
        &self,
        reference: &str,
        variable: &str,
        job: &mut JobContext,
    ) -> Result<ResolvedDataset> {
        let (source, access) = self.open(reference, job)?;

        let lazy = source.variable(variable).map_err(|e| {
            BridgeError::resolution(reference, format!("variable {} not available: {}", variable, e))
        })?;

        let chunks = self.chunks_for(source.as_ref());
        debug!(reference = %reference, ?chunks, "Planned chunks");

        Ok(ResolvedDataset {
            reference: reference.to_string(),
            variable: lazy.with_chunks(&chunks),
            attrs: source.attrs().clone(),
            access,
            chunks,
        })
    }

    /// Chunk sizes for reading variables of `source`.
    pub fn chunks_for(&self, source: &dyn DatasetSource) -> IndexMap<String, usize> {
        plan_chunks(&source.dim_sizes(), self.max_chunk_elements)
    }

    /// Resolve `reference` to an opened dataset, streamed or materialized.
    pub fn open(
        &self,
        reference: &str,
        job: &mut JobContext,
    ) -> Result<(Box<dyn DatasetSource>, AccessMode)> {
        let (location, access) = match Reference::parse(reference) {
            Reference::Remote(url) if self.probe.is_streamable(url) => {
                (url.to_string(), AccessMode::Streamed)
            }
            Reference::Remote(url) => {
                let path = self.materialize(url, job)?;
                (path.to_string_lossy().into_owned(), AccessMode::Materialized { path })
            }
            Reference::Local(path) => {
                if !path.is_file() {
                    return Err(BridgeError::resolution(reference, "file not found"));
                }
                (path.to_string_lossy().into_owned(), AccessMode::Materialized { path })
            }
        };

        let source = self
            .opener
            .open(&location)
            .map_err(|e| BridgeError::resolution(reference, e))?;
        Ok((source, access))
    }

    fn materialize(&self, url: &str, job: &mut JobContext) -> Result<PathBuf> {
        if let Some(path) = job.cached_download(url) {
            debug!(url = %url, "Reusing downloaded input");
            return Ok(path.clone());
        }

        let dir = job.inputs_dir();
        fs::create_dir_all(&dir).map_err(|e| BridgeError::resolution(url, e))?;
        let dest = dir.join(download_name(url, job.download_count()));

        self.fetcher.fetch(url, &dest)?;
        job.remember_download(url, dest.clone());
        Ok(dest)
    }
}

/// Local file name for the `index`-th download of a job.
fn download_name(url: &str, index: usize) -> String {
    let path = url.split(|c: char| c == '?' || c == '#').next().unwrap_or(url);
    let last = path.rsplit('/').next().unwrap_or_default();
    let clean: String = last
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'))
        .collect();
    let clean = if clean.is_empty() || clean.chars().all(|c| c == '.') {
        "input.nc".to_string()
    } else {
        clean
    };
    format!("{:03}-{}", index, clean)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Read, Write};
    use std::net::TcpListener;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use netcdf_io::Dataset;
    use test_utils::Fixture;

    /// Serve one canned HTTP response on a local port.
    fn serve_once(status: &'static str, body: &'static str) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        std::thread::spawn(move || {
            if let Ok((mut stream, _)) = listener.accept() {
                let mut buf = [0u8; 2048];
                let _ = stream.read(&mut buf);
                let response = format!(
                    "HTTP/1.1 {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                    status,
                    body.len(),
                    body
                );
                let _ = stream.write_all(response.as_bytes());
            }
        });
        format!("http://{}/thredds/dodsC/tasmax.nc", addr)
    }

    fn refused_url() -> String {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        format!("http://{}/tasmax.nc", addr)
    }

    fn probe() -> HttpProbe {
        HttpProbe::new(Duration::from_secs(5)).unwrap()
    }

    #[test]
    fn test_probe_accepts_dataset_descriptor() {
        let url = serve_once("200 OK", "Dataset {\n    Float32 tasmax[time = 365];\n} tasmax.nc;");
        assert!(probe().is_streamable(&url));
    }

    #[test]
    fn test_probe_rejects_other_answers() {
        assert!(!probe().is_streamable(&serve_once("404 Not Found", "Dataset")));
        assert!(!probe().is_streamable(&serve_once("200 OK", "<html>Error</html>")));
        assert!(!probe().is_streamable(&refused_url()));
    }

    #[test]
    fn test_fetcher_writes_body() {
        let url = serve_once("200 OK", "netcdf bytes");
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("out.nc");

        let bytes = HttpFetcher::new(Duration::from_secs(5))
            .unwrap()
            .fetch(&url, &dest)
            .unwrap();
        assert_eq!(bytes, 12);
        assert_eq!(fs::read_to_string(dest).unwrap(), "netcdf bytes");

        let err = HttpFetcher::new(Duration::from_secs(5))
            .unwrap()
            .fetch(&serve_once("500 Internal Server Error", ""), &dir.path().join("x"))
            .unwrap_err();
        assert_eq!(err.kind(), "input_resolution");
    }

    struct AlwaysStreamable;

    impl StreamProbe for AlwaysStreamable {
        fn is_streamable(&self, _url: &str) -> bool {
            true
        }
    }

    /// Serves an in-memory dataset for any location.
    struct MemoryOpener(Dataset);

    impl DatasetOpener for MemoryOpener {
        fn open(&self, _location: &str) -> NetCdfResult<Box<dyn DatasetSource>> {
            Ok(Box::new(self.0.clone()))
        }
    }

    /// Writes a fixture instead of downloading, counting calls.
    #[derive(Default)]
    struct FixtureFetcher {
        calls: AtomicUsize,
    }

    impl Fetcher for FixtureFetcher {
        fn fetch(&self, _url: &str, dest: &Path) -> Result<u64> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Fixture::new("tasmax").write_to(dest);
            Ok(fs::metadata(dest)?.len())
        }
    }

    #[test]
    fn test_streamable_url_is_not_downloaded() {
        let fetcher = Arc::new(FixtureFetcher::default());
        let resolver = DatasetResolver::new(
            Arc::new(AlwaysStreamable),
            Arc::new(MemoryOpener(Fixture::new("tasmax").dataset())),
            fetcher.clone(),
        );
        let dir = tempfile::tempdir().unwrap();
        let mut job = JobContext::new("j", dir.path());

        let resolved = resolver
            .resolve("https://example.org/dodsC/tasmax.nc", "tasmax", &mut job)
            .unwrap();

        assert_eq!(resolved.access, AccessMode::Streamed);
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 0);
        assert!(!job.inputs_dir().exists());
    }

    #[test]
    fn test_unreachable_url_falls_back_to_download_once() {
        let fetcher = Arc::new(FixtureFetcher::default());
        let resolver = DatasetResolver::new(Arc::new(probe()), Arc::new(NetCdfOpener), fetcher.clone());
        let dir = tempfile::tempdir().unwrap();
        let mut job = JobContext::new("j", dir.path());
        let url = refused_url();

        let first = resolver.resolve(&url, "tasmax", &mut job).unwrap();
        let second = resolver.resolve(&url, "tasmax", &mut job).unwrap();

        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 1);
        match (&first.access, &second.access) {
            (AccessMode::Materialized { path: a }, AccessMode::Materialized { path: b }) => {
                assert_eq!(a, b);
                assert!(a.starts_with(job.inputs_dir()));
            }
            other => panic!("unexpected access modes {:?}", other),
        }
    }

    #[test]
    fn test_local_reference_is_idempotent_and_chunked() {
        let dir = tempfile::tempdir().unwrap();
        let path = Fixture::new("tasmin").seed(3).write_in(dir.path());
        let resolver = DatasetResolver::new(
            Arc::new(NoProbe),
            Arc::new(NetCdfOpener),
            Arc::new(FixtureFetcher::default()),
        )
        .with_max_chunk_elements(1000);
        let mut job = JobContext::new("j", dir.path());

        let reference = format!("file://{}", path.display());
        let a = resolver.resolve(&reference, "tasmin", &mut job).unwrap();
        let b = resolver.resolve(path.to_str().unwrap(), "tasmin", &mut job).unwrap();

        assert_eq!(a.variable.load().unwrap().values, b.variable.load().unwrap().values);
        let product: usize = a.chunks.values().product();
        assert!(product < 1000);
        assert!(a.variable.block_count() > 1);
        assert_eq!(
            netcdf_io::text_attr(&a.attrs, "driving_model_id"),
            Some(test_utils::DRIVING_MODEL)
        );
    }

    #[test]
    fn test_resolution_failures_name_the_reference() {
        let dir = tempfile::tempdir().unwrap();
        let path = Fixture::new("tasmin").write_in(dir.path());
        let resolver = DatasetResolver::new(
            Arc::new(NoProbe),
            Arc::new(NetCdfOpener),
            Arc::new(FixtureFetcher::default()),
        );
        let mut job = JobContext::new("j", dir.path());

        let missing = dir.path().join("nope.nc");
        let err = resolver
            .resolve(missing.to_str().unwrap(), "tasmin", &mut job)
            .unwrap_err();
        assert!(err.to_string().contains("nope.nc"));

        let err = resolver
            .resolve(path.to_str().unwrap(), "tasmax", &mut job)
            .unwrap_err();
        assert_eq!(err.kind(), "input_resolution");
        assert!(err.to_string().contains("tasmax"));
    }

    #[test]
    fn test_local_download_failure_is_a_resolution_error() {
        let dir = tempfile::tempdir().unwrap();
        let mut job = JobContext::new("j", dir.path());
        fs::write(job.inputs_dir(), "").unwrap();
        let resolver = DatasetResolver::new(
            Arc::new(NoProbe),
            Arc::new(NetCdfOpener),
            Arc::new(FixtureFetcher::default()),
        );

        let url = "https://example.org/data/tasmax.nc";
        let err = resolver.resolve(url, "tasmax", &mut job).unwrap_err();
        assert_eq!(err.kind(), "input_resolution");
        assert!(err.to_string().contains(url));

        let fetch_url = serve_once("200 OK", "netcdf bytes");
        let err = HttpFetcher::new(Duration::from_secs(5))
            .unwrap()
            .fetch(&fetch_url, &dir.path().join("missing").join("out.nc"))
            .unwrap_err();
        assert_eq!(err.kind(), "input_resolution");
        assert!(err.to_string().contains(&fetch_url));
    }

    #[test]
    fn test_download_name() {
        assert_eq!(download_name("http://h/a/tasmax_day.nc?x=1", 0), "000-tasmax_day.nc");
        assert_eq!(download_name("http://h/", 12), "012-input.nc");
        assert!(is_remote("https://h/x.nc"));
        assert!(!is_remote("file:///tmp/x.nc"));
    }
}
