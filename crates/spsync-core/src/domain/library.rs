//! Resolved document library handle

use serde::{Deserialize, Serialize};

use super::newtypes::RemoteId;

/// Identity of a document library, resolved once when a library is opened
///
/// Immutable after construction; every library-scoped endpoint is built
/// from these four values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LibraryHandle {
    host: String,
    site: String,
    library_id: RemoteId,
    drive_id: RemoteId,
}

impl LibraryHandle {
    pub fn new(
        host: impl Into<String>,
        site: impl Into<String>,
        library_id: RemoteId,
        drive_id: RemoteId,
    ) -> Self {
        Self {
            host: host.into(),
            site: site.into(),
            library_id,
            drive_id,
        }
    }

    /// SharePoint host name, e.g. `contoso.sharepoint.com`
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Site name relative to `/sites/`
    pub fn site(&self) -> &str {
        &self.site
    }

    /// List id of the document library
    pub fn library_id(&self) -> &RemoteId {
        &self.library_id
    }

    /// Id of the drive backing the library
    pub fn drive_id(&self) -> &RemoteId {
        &self.drive_id
    }

    /// `/sites/{host}:/sites/{site}:` prefix used for list and column endpoints
    pub fn site_path(&self) -> String {
        format!("/sites/{}:/sites/{}:", self.host, self.site)
    }

    /// `/sites/{host}:/sites/{site}:/lists/{library_id}` prefix
    pub fn list_path(&self) -> String {
        format!("{}/lists/{}", self.site_path(), self.library_id)
    }
}
