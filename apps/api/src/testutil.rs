//! In-memory fakes for every external service contract, plus a shared call
//! log for asserting pipeline step ordering.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use bytes::Bytes;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::analysis::AnalysisRequest;
use crate::models::user::User;
use crate::services::ai::{
    AssistantMessage, ChatMessage, ChatOptions, ChatResponse, ChatService, MessageContent,
};
use crate::services::blob::{BlobStore, UploadFile};
use crate::services::identity::{IdentityProvider, Session};
use crate::services::kv::KvStore;
use crate::services::pdf::{PdfRenderer, RenderedPage};
use crate::services::Services;

/// Records the order of external calls made by the code under test.
#[derive(Clone, Default)]
pub struct CallLog(Arc<Mutex<Vec<String>>>);

impl CallLog {
    pub fn push(&self, call: &str) {
        self.0.lock().unwrap().push(call.to_string());
    }

    pub fn calls(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }
}

/// A valid feedback payload in the wire format the AI is asked for.
pub fn feedback_json() -> String {
    serde_json::json!({
        "overallScore": 85,
        "toneStyleScore": 80,
        "contentScore": 78,
        "structureScore": 90,
        "skillsScore": 70,
        "improvementTips": ["Quantify your impact"],
        "missingKeywords": ["Kubernetes"],
    })
    .to_string()
}

/// A well-formed analysis submission.
pub fn pdf_request() -> AnalysisRequest {
    AnalysisRequest {
        company_name: "Google".to_string(),
        job_title: "Backend Developer".to_string(),
        job_description: "Build and run distributed services.".to_string(),
        file_name: "resume.pdf".to_string(),
        file: Bytes::from_static(b"%PDF-1.7 fake resume body"),
    }
}

pub struct MemoryBlobStore {
    pub files: Mutex<HashMap<String, Bytes>>,
    pub fail_uploads: AtomicBool,
    log: CallLog,
}

impl MemoryBlobStore {
    pub fn new(log: CallLog) -> Self {
        Self {
            files: Mutex::new(HashMap::new()),
            fail_uploads: AtomicBool::new(false),
            log,
        }
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn upload(&self, file: UploadFile) -> Result<String, AppError> {
        self.log.push("blob.upload");
        if self.fail_uploads.load(Ordering::SeqCst) {
            return Err(AppError::Storage("no locator returned".to_string()));
        }
        let locator = format!("mem/{}/{}", Uuid::new_v4(), file.file_name);
        self.files.lock().unwrap().insert(locator.clone(), file.bytes);
        Ok(locator)
    }

    async fn read(&self, locator: &str) -> Result<Bytes, AppError> {
        self.log.push("blob.read");
        self.files
            .lock()
            .unwrap()
            .get(locator)
            .cloned()
            .ok_or_else(|| AppError::Storage(format!("no blob at '{locator}'")))
    }

    async fn delete(&self, locator: &str) -> Result<(), AppError> {
        self.log.push("blob.delete");
        self.files.lock().unwrap().remove(locator);
        Ok(())
    }

    async fn list(&self, dir: &str) -> Result<Vec<String>, AppError> {
        self.log.push("blob.list");
        Ok(self
            .files
            .lock()
            .unwrap()
            .keys()
            .filter(|key| key.starts_with(dir))
            .cloned()
            .collect())
    }

    async fn share_url(&self, locator: &str) -> Result<String, AppError> {
        self.log.push("blob.share_url");
        Ok(format!("memory://{locator}"))
    }
}

pub struct MemoryKvStore {
    pub map: Mutex<HashMap<String, String>>,
    pub fail_sets: AtomicBool,
    log: CallLog,
}

impl MemoryKvStore {
    pub fn new(log: CallLog) -> Self {
        Self {
            map: Mutex::new(HashMap::new()),
            fail_sets: AtomicBool::new(false),
            log,
        }
    }
}

#[async_trait]
impl KvStore for MemoryKvStore {
    async fn get(&self, key: &str) -> Result<Option<String>, AppError> {
        self.log.push("kv.get");
        Ok(self.map.lock().unwrap().get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), AppError> {
        self.log.push("kv.set");
        if self.fail_sets.load(Ordering::SeqCst) {
            return Err(AppError::Storage("kv write rejected".to_string()));
        }
        self.map
            .lock()
            .unwrap()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<bool, AppError> {
        self.log.push("kv.delete");
        Ok(self.map.lock().unwrap().remove(key).is_some())
    }

    async fn list(&self, pattern: &str) -> Result<Vec<String>, AppError> {
        self.log.push("kv.list");
        let prefix = pattern.strip_suffix('*').unwrap_or(pattern);
        Ok(self
            .map
            .lock()
            .unwrap()
            .keys()
            .filter(|key| key.starts_with(prefix))
            .cloned()
            .collect())
    }
}

/// Chat fake that replies with a configurable message.
pub struct ScriptedChat {
    reply: Mutex<MessageContent>,
    pub fail: AtomicBool,
    log: CallLog,
}

impl ScriptedChat {
    pub fn new(log: CallLog) -> Self {
        Self {
            reply: Mutex::new(MessageContent::Text(feedback_json())),
            fail: AtomicBool::new(false),
            log,
        }
    }

    pub fn set_reply(&self, content: MessageContent) {
        *self.reply.lock().unwrap() = content;
    }
}

#[async_trait]
impl ChatService for ScriptedChat {
    async fn invoke(
        &self,
        _messages: Vec<ChatMessage>,
        _options: ChatOptions,
    ) -> Result<ChatResponse, AppError> {
        self.log.push("chat.invoke");
        if self.fail.load(Ordering::SeqCst) {
            return Err(AppError::AiInvocationFailed("model unavailable".to_string()));
        }
        Ok(ChatResponse {
            message: AssistantMessage {
                content: self.reply.lock().unwrap().clone(),
            },
        })
    }
}

pub struct StubRenderer {
    pub fail: AtomicBool,
    log: CallLog,
}

impl StubRenderer {
    pub fn new(log: CallLog) -> Self {
        Self {
            fail: AtomicBool::new(false),
            log,
        }
    }
}

#[async_trait]
impl PdfRenderer for StubRenderer {
    async fn render_first_page(&self, _pdf: &[u8]) -> Result<RenderedPage, AppError> {
        self.log.push("pdf.render");
        if self.fail.load(Ordering::SeqCst) {
            return Err(AppError::ConversionFailed("renderer crashed".to_string()));
        }
        Ok(RenderedPage {
            file_name: "resume-page-1.png".to_string(),
            content_type: "image/png",
            bytes: Bytes::from_static(b"\x89PNG fake image"),
        })
    }
}

/// Identity fake: everyone is signed in as "tester".
pub struct StaticIdentity;

#[async_trait]
impl IdentityProvider for StaticIdentity {
    async fn sign_in(&self, username: &str, _secret: &str) -> Result<Session, AppError> {
        Ok(Session {
            token: "test-token".to_string(),
            user: User {
                username: username.to_string(),
                email: None,
            },
        })
    }

    async fn sign_out(&self, _token: &str) -> Result<(), AppError> {
        Ok(())
    }

    async fn is_authenticated(&self, _token: &str) -> Result<bool, AppError> {
        Ok(true)
    }

    async fn current_user(&self, _token: &str) -> Result<Option<User>, AppError> {
        Ok(Some(User {
            username: "tester".to_string(),
            email: None,
        }))
    }
}

/// The five fakes bundled into a `Services`, with the shared call log.
pub struct TestHarness {
    pub log: CallLog,
    pub blobs: Arc<MemoryBlobStore>,
    pub kv: Arc<MemoryKvStore>,
    pub chat: Arc<ScriptedChat>,
    pub renderer: Arc<StubRenderer>,
    pub services: Arc<Services>,
}

impl TestHarness {
    pub fn new() -> Self {
        let log = CallLog::default();
        let blobs = Arc::new(MemoryBlobStore::new(log.clone()));
        let kv = Arc::new(MemoryKvStore::new(log.clone()));
        let chat = Arc::new(ScriptedChat::new(log.clone()));
        let renderer = Arc::new(StubRenderer::new(log.clone()));

        let services = Arc::new(Services {
            identity: Arc::new(StaticIdentity),
            blobs: blobs.clone(),
            kv: kv.clone(),
            chat: chat.clone(),
            renderer: renderer.clone(),
        });

        Self {
            log,
            blobs,
            kv,
            chat,
            renderer,
            services,
        }
    }
}
