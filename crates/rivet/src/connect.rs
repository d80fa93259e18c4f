use crate::{Error, Gateway, Result};

use url::Url;

use std::sync::Arc;

/// Resolves a gateway URL to a gateway implementation.
///
/// The scheme selects the adapter. `memory:` is the only built-in scheme and
/// requires the `memory` feature.
#[derive(Debug)]
pub struct Connect {
    url: Url,
}

impl Connect {
    pub fn new(url: &str) -> Result<Self> {
        let url = Url::parse(url)?;
        Ok(Self { url })
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub async fn connect(&self) -> Result<Arc<dyn Gateway>> {
        match self.url.scheme() {
            "memory" => connect_memory(&self.url),
            scheme => Err(Error::invalid_argument(format!(
                "unsupported gateway; scheme={scheme}; url={}",
                self.url
            ))),
        }
    }
}

#[cfg(feature = "memory")]
fn connect_memory(_url: &Url) -> Result<Arc<dyn Gateway>> {
    Ok(Arc::new(rivet_driver_memory::Memory::new()))
}

#[cfg(not(feature = "memory"))]
fn connect_memory(_url: &Url) -> Result<Arc<dyn Gateway>> {
    Err(anyhow::anyhow!("`memory` feature not enabled").into())
}
