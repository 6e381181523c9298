use async_trait::async_trait;
use kubedoom::config::ServerConfig;
use kubedoom::control;
use kubedoom::error::{KubedoomError, Result};
use kubedoom::k8s::{PodBackend, PodRef};
use kubedoom::protocol::{pod_id, Command};
use kubedoom::server::Server;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

struct ClusterStub {
    pods: Mutex<Option<Vec<PodRef>>>,
    deleted: mpsc::UnboundedSender<PodRef>,
}

impl ClusterStub {
    fn set_pods(&self, names: &[&str]) {
        let pods = names
            .iter()
            .map(|n| n.parse().expect("valid pod name"))
            .collect();
        *self.pods.lock().expect("lock") = Some(pods);
    }

    fn fail(&self) {
        *self.pods.lock().expect("lock") = None;
    }
}

#[async_trait]
impl PodBackend for ClusterStub {
    async fn list_pods(&self) -> Result<Vec<PodRef>> {
        self.pods
            .lock()
            .expect("lock")
            .clone()
            .ok_or_else(|| KubedoomError::KubernetesError("connection refused".to_string()))
    }

    async fn delete_pod(&self, pod: &PodRef) -> Result<()> {
        let _ = self.deleted.send(pod.clone());
        Ok(())
    }
}

struct Harness {
    _dir: tempfile::TempDir,
    socket: PathBuf,
    cluster: Arc<ClusterStub>,
    deleted: mpsc::UnboundedReceiver<PodRef>,
    stop: Option<oneshot::Sender<()>>,
    server: JoinHandle<Result<()>>,
}

impl Harness {
    fn start(names: &[&str]) -> Self {
        let dir = tempfile::tempdir().expect("temp dir");
        let socket = dir.path().join("kubedoom.sock");

        let (deleted_tx, deleted) = mpsc::unbounded_channel();
        let cluster = Arc::new(ClusterStub {
            pods: Mutex::new(None),
            deleted: deleted_tx,
        });
        cluster.set_pods(names);

        let config = ServerConfig {
            socket_path: socket.clone(),
            read_timeout_secs: 5,
            ..Default::default()
        };
        let server = Server::bind(&config, cluster.clone()).expect("bind");

        let (stop, stopped) = oneshot::channel::<()>();
        let server = tokio::spawn(server.run_until(async move {
            let _ = stopped.await;
        }));

        Self {
            _dir: dir,
            socket,
            cluster,
            deleted,
            stop: Some(stop),
            server,
        }
    }

    async fn list(&self) -> Vec<String> {
        control::list(&self.socket, 255).await.expect("list")
    }

    async fn next_delete(&mut self) -> Option<PodRef> {
        tokio::time::timeout(Duration::from_secs(5), self.deleted.recv())
            .await
            .ok()
            .flatten()
    }

    async fn no_further_delete(&mut self) -> bool {
        tokio::time::timeout(Duration::from_millis(200), self.deleted.recv())
            .await
            .is_err()
    }

    async fn stop(mut self) {
        if let Some(stop) = self.stop.take() {
            let _ = stop.send(());
        }
        let result = self.server.await.expect("server task");
        assert!(result.is_ok());
        assert!(!self.socket.exists());
    }
}

#[test]
fn test_error_types() {
    let err = KubedoomError::MalformedPodName("nginx".to_string());
    assert!(err.to_string().contains("nginx"));

    let err = KubedoomError::SocketPathInUse(PathBuf::from("/dockerdoom.socket"));
    assert!(err.to_string().contains("/dockerdoom.socket"));
}

#[test]
fn test_version_const() {
    assert!(!kubedoom::VERSION.is_empty());
}

#[tokio::test]
async fn test_list_then_kill_end_to_end() {
    let mut harness = Harness::start(&["kube-system/coredns-1", "default/nginx-7"]);

    assert_eq!(
        harness.list().await,
        vec!["kube-system/coredns-1", "default/nginx-7"]
    );

    control::kill(&harness.socket, pod_id("default/nginx-7"))
        .await
        .expect("kill");

    assert_eq!(
        harness.next_delete().await,
        Some(PodRef::new("default", "nginx-7"))
    );
    assert!(harness.no_further_delete().await);

    harness.stop().await;
}

#[tokio::test]
async fn test_kill_without_match_deletes_nothing() {
    let mut harness = Harness::start(&["default/nginx-7"]);

    control::kill(&harness.socket, pod_id("default/nginx-8"))
        .await
        .expect("kill");

    assert!(harness.no_further_delete().await);
    harness.stop().await;
}

#[tokio::test]
async fn test_each_session_sees_a_fresh_snapshot() {
    let harness = Harness::start(&["default/nginx-7"]);
    assert_eq!(harness.list().await, vec!["default/nginx-7"]);

    harness
        .cluster
        .set_pods(&["default/nginx-7", "default/redis-0"]);
    assert_eq!(
        harness.list().await,
        vec!["default/nginx-7", "default/redis-0"]
    );

    harness.stop().await;
}

#[tokio::test]
async fn test_concurrent_sessions() {
    let harness = Harness::start(&["kube-system/coredns-1", "default/nginx-7"]);

    let listings =
        futures::future::join_all((0..8).map(|_| control::list(&harness.socket, 255))).await;

    for listing in listings {
        assert_eq!(
            listing.expect("list"),
            vec!["kube-system/coredns-1", "default/nginx-7"]
        );
    }

    harness.stop().await;
}

#[tokio::test]
async fn test_bad_requests_do_not_stop_the_server() {
    let mut harness = Harness::start(&["default/nginx-7"]);

    let response = control::send(&harness.socket, &Command::Unrecognized("kill abc".into()))
        .await
        .expect("malformed kill");
    assert!(response.is_empty());

    let response = control::send(&harness.socket, &Command::Unrecognized("foo".into()))
        .await
        .expect("unrecognized");
    assert!(response.is_empty());

    harness.cluster.fail();
    assert!(harness.list().await.is_empty());

    harness.cluster.set_pods(&["default/nginx-7"]);
    assert_eq!(harness.list().await, vec!["default/nginx-7"]);
    assert!(harness.no_further_delete().await);

    harness.stop().await;
}

#[tokio::test]
async fn test_silent_client_does_not_block_others() {
    let harness = Harness::start(&["default/nginx-7"]);

    let _idle = tokio::net::UnixStream::connect(&harness.socket)
        .await
        .expect("connect");

    assert_eq!(harness.list().await, vec!["default/nginx-7"]);

    harness.stop().await;
}

#[tokio::test]
async fn test_second_server_on_live_socket_is_refused() {
    let harness = Harness::start(&[]);

    let config = ServerConfig {
        socket_path: harness.socket.clone(),
        ..Default::default()
    };
    let err = Server::bind(&config, harness.cluster.clone())
        .err()
        .expect("bind refused");
    assert!(matches!(err, KubedoomError::SocketPathInUse(_)));

    harness.stop().await;
}
