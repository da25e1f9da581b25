//! Fixtures shared by the unit tests of this crate

use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use git2::{Repository, Signature};

use crate::services::{CreationError, CreationRequest, RemoteCreationResult, RemoteRepoCreator};

/// Creator answering with a fixed result and recording what it was asked
pub struct StubCreator {
    answer: Result<RemoteCreationResult, u16>,
    requests: Mutex<Vec<CreationRequest>>,
}

impl StubCreator {
    pub fn succeeding(remote_url: String) -> Arc<Self> {
        Self::answering(Ok(RemoteCreationResult {
            status: 0,
            message: remote_url,
        }))
    }

    pub fn rejecting(message: &str) -> Arc<Self> {
        Self::answering(Ok(RemoteCreationResult {
            status: 1,
            message: message.to_string(),
        }))
    }

    /// Fails at the transport level with the given HTTP status
    pub fn failing(status: u16) -> Arc<Self> {
        Self::answering(Err(status))
    }

    fn answering(answer: Result<RemoteCreationResult, u16>) -> Arc<Self> {
        Arc::new(Self {
            answer,
            requests: Mutex::new(Vec::new()),
        })
    }

    pub fn requests(&self) -> Vec<CreationRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl RemoteRepoCreator for StubCreator {
    async fn request_creation(
        &self,
        request: CreationRequest,
    ) -> Result<RemoteCreationResult, CreationError> {
        self.requests.lock().unwrap().push(request);
        match &self.answer {
            Ok(result) => Ok(result.clone()),
            Err(status) => Err(CreationError::Status {
                status: *status,
                body: "unavailable".to_string(),
            }),
        }
    }
}

/// Bare repository with one commit on `main` holding `files`
pub fn seed_bare_repo(path: &Path, files: &[(&str, &str)]) -> Repository {
    let repo = Repository::init_bare(path).unwrap();
    {
        let mut builder = repo.treebuilder(None).unwrap();
        for (name, content) in files {
            let blob = repo.blob(content.as_bytes()).unwrap();
            builder.insert(name, blob, 0o100644).unwrap();
        }
        let tree_id = builder.write().unwrap();
        let tree = repo.find_tree(tree_id).unwrap();
        let signature = Signature::now("Seeder", "seeder@example.com").unwrap();
        repo.commit(
            Some("refs/heads/main"),
            &signature,
            &signature,
            "Initial commit",
            &tree,
            &[],
        )
        .unwrap();
    }
    repo.set_head("refs/heads/main").unwrap();
    repo
}

pub fn file_url(path: &Path) -> String {
    format!("file://{}", path.display())
}
