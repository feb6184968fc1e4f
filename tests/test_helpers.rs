#![allow(dead_code)]

use linkedin_automation_rs::*;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::oneshot;

/// Scripted reply for one backend call.
#[derive(Debug, Clone)]
pub enum Reply<T> {
    Ok(T),
    Fail,
    HttpError(u16, String),
}

impl<T> Reply<T> {
    fn into_result(self, context: &str) -> Result<T> {
        match self {
            Reply::Ok(v) => Ok(v),
            Reply::Fail => Err(AutomationError::Timeout {
                context: context.to_string(),
            }),
            Reply::HttpError(status, message) => Err(AutomationError::Http { status, message }),
        }
    }
}

/// In-memory backend with scripted replies and call counters.
///
/// Status replies are consumed in order; once the script runs out every
/// poll returns `default_status`.
pub struct FakeBackend {
    statuses: Mutex<VecDeque<Reply<JobStatus>>>,
    default_status: Mutex<JobStatus>,
    start_reply: Mutex<Reply<StartResponse>>,
    cancel_reply: Mutex<Reply<CancelResponse>>,
    kill_reply: Mutex<Reply<ForceKillResponse>>,
    status_delay: Mutex<Duration>,
    pub started: Mutex<Vec<AutomationJob>>,
    pub start_calls: AtomicUsize,
    pub status_calls: AtomicUsize,
    pub cancel_calls: AtomicUsize,
    pub kill_calls: AtomicUsize,
}

impl Default for FakeBackend {
    fn default() -> Self {
        Self {
            statuses: Mutex::new(VecDeque::new()),
            default_status: Mutex::new(JobStatus::idle()),
            start_reply: Mutex::new(Reply::Ok(start_response("abc123"))),
            cancel_reply: Mutex::new(Reply::Ok(CancelResponse {
                success: true,
                message: Some("Cancellation requested".into()),
                error: None,
            })),
            kill_reply: Mutex::new(Reply::Ok(ForceKillResponse {
                success: true,
                message: Some("Killed".into()),
                error: None,
            })),
            status_delay: Mutex::new(Duration::ZERO),
            started: Mutex::new(Vec::new()),
            start_calls: AtomicUsize::new(0),
            status_calls: AtomicUsize::new(0),
            cancel_calls: AtomicUsize::new(0),
            kill_calls: AtomicUsize::new(0),
        }
    }
}

impl FakeBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_status(&self, reply: Reply<JobStatus>) {
        self.statuses.lock().unwrap().push_back(reply);
    }

    pub fn set_default_status(&self, status: JobStatus) {
        *self.default_status.lock().unwrap() = status;
    }

    pub fn set_start_reply(&self, reply: Reply<StartResponse>) {
        *self.start_reply.lock().unwrap() = reply;
    }

    pub fn set_cancel_reply(&self, reply: Reply<CancelResponse>) {
        *self.cancel_reply.lock().unwrap() = reply;
    }

    pub fn set_kill_reply(&self, reply: Reply<ForceKillResponse>) {
        *self.kill_reply.lock().unwrap() = reply;
    }

    pub fn set_status_delay(&self, delay: Duration) {
        *self.status_delay.lock().unwrap() = delay;
    }

    pub fn count(counter: &AtomicUsize) -> usize {
        counter.load(Ordering::SeqCst)
    }
}

impl JobBackend for FakeBackend {
    async fn start_job(&self, job: &AutomationJob) -> Result<StartResponse> {
        self.start_calls.fetch_add(1, Ordering::SeqCst);
        self.started.lock().unwrap().push(job.clone());
        let reply = self.start_reply.lock().unwrap().clone();
        reply.into_result("start")
    }

    async fn job_status(&self) -> Result<JobStatus> {
        self.status_calls.fetch_add(1, Ordering::SeqCst);
        let delay = *self.status_delay.lock().unwrap();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        let scripted = self.statuses.lock().unwrap().pop_front();
        let reply = scripted.unwrap_or_else(|| Reply::Ok(self.default_status.lock().unwrap().clone()));
        reply.into_result("status")
    }

    async fn cancel_job(&self) -> Result<CancelResponse> {
        self.cancel_calls.fetch_add(1, Ordering::SeqCst);
        let reply = self.cancel_reply.lock().unwrap().clone();
        reply.into_result("cancel")
    }

    async fn force_kill_job(&self) -> Result<ForceKillResponse> {
        self.kill_calls.fetch_add(1, Ordering::SeqCst);
        let reply = self.kill_reply.lock().unwrap().clone();
        reply.into_result("force-kill")
    }
}

pub fn start_response(job_id: &str) -> StartResponse {
    StartResponse {
        job_id: Some(job_id.to_string()),
        message: Some("Job started".into()),
    }
}

pub fn running(job_id: &str, script: &str) -> JobStatus {
    JobStatus {
        is_running: true,
        job_id: Some(job_id.to_string()),
        script_name: Some(script.to_string()),
        status: JobState::Running,
        ..JobStatus::default()
    }
}

pub fn test_config() -> ClientConfig {
    ClientConfig::builder()
        .with_poll_interval(Duration::from_millis(3000))
        .with_cancel_budget(Duration::from_millis(500), 30)
        .build()
}

/// Raw HTTP request captured by [`serve_once`].
#[derive(Debug)]
pub struct CapturedRequest {
    pub head: String,
    pub body: String,
}

impl CapturedRequest {
    /// `"POST /api/automation/job/cancel"`
    pub fn request_line(&self) -> &str {
        let line = self.head.lines().next().unwrap_or_default();
        line.rsplit_once(' ').map_or(line, |(start, _)| start)
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.head.lines().skip(1).find_map(|line| {
            let (key, value) = line.split_once(':')?;
            key.eq_ignore_ascii_case(name).then(|| value.trim())
        })
    }
}

/// Serve exactly one request with a canned response on a random local port.
///
/// Returns the base URL (with `/api`) and a receiver for the request the
/// server saw.
pub async fn serve_once(status: u16, body: &'static str) -> (String, oneshot::Receiver<CapturedRequest>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (tx, rx) = oneshot::channel();
    tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let request = read_request(&mut socket).await;
        let _ = tx.send(request);
        let reason = match status {
            200 => "OK",
            409 => "Conflict",
            500 => "Internal Server Error",
            _ => "Status",
        };
        let response = format!(
            "HTTP/1.1 {} {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
            status,
            reason,
            body.len(),
            body
        );
        socket.write_all(response.as_bytes()).await.unwrap();
        let _ = socket.shutdown().await;
    });
    (format!("http://{}/api", addr), rx)
}

/// Accept one connection and never answer it.
pub async fn serve_silent(hold: Duration) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let (_socket, _) = listener.accept().await.unwrap();
        tokio::time::sleep(hold).await;
    });
    format!("http://{}/api", addr)
}

async fn read_request(socket: &mut TcpStream) -> CapturedRequest {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];
    let mut head_end = None;
    loop {
        let n = socket.read(&mut chunk).await.unwrap();
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..n]);
        if head_end.is_none() {
            head_end = buf.windows(4).position(|w| w == b"\r\n\r\n");
        }
        if let Some(end) = head_end {
            let head = String::from_utf8_lossy(&buf[..end]).to_ascii_lowercase();
            let length = head
                .lines()
                .find_map(|line| line.strip_prefix("content-length:"))
                .and_then(|v| v.trim().parse::<usize>().ok())
                .unwrap_or(0);
            if buf.len() >= end + 4 + length {
                break;
            }
        }
    }
    let end = head_end.unwrap_or(buf.len());
    CapturedRequest {
        head: String::from_utf8_lossy(&buf[..end]).into_owned(),
        body: String::from_utf8_lossy(&buf[(end + 4).min(buf.len())..]).into_owned(),
    }
}

pub fn client_for(base_url: &str) -> AutomationClient {
    AutomationClient::new(ClientConfig::builder().with_base_url(base_url).build())
}
