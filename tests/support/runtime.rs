use anyhow::{Result, bail};
use std::{
    env,
    os::unix::net::UnixStream,
    path::{Path, PathBuf},
    sync::OnceLock,
    thread,
    time::{Duration, Instant},
};

const SOCKET_WAIT_TIMEOUT: Duration = Duration::from_secs(5);

/// Ensure a Docker-compatible socket is reachable for testcontainers.
///
/// A reachable Podman socket is exported as `DOCKER_HOST`.
///
/// # Errors
/// Returns an error if no Docker/Podman socket accepts connections.
pub fn ensure_container_runtime() -> Result<()> {
    static INIT: OnceLock<Result<(), String>> = OnceLock::new();
    match INIT.get_or_init(init_container_runtime) {
        Ok(()) => Ok(()),
        Err(message) => bail!("{message}"),
    }
}

fn init_container_runtime() -> Result<(), String> {
    if let Ok(docker_host) = env::var("DOCKER_HOST") {
        return validate_docker_host(&docker_host);
    }

    if wait_for_socket(Path::new("/var/run/docker.sock"), SOCKET_WAIT_TIMEOUT) {
        return Ok(());
    }

    if let Some(path) = find_podman_socket() {
        if wait_for_socket(&path, SOCKET_WAIT_TIMEOUT) {
            env::set_var("DOCKER_HOST", format!("unix://{}", path.display()));
            return Ok(());
        }
        return Err(format!(
            "Podman socket found at `{}`, but it is not accepting connections.",
            path.display()
        ));
    }

    Err("No container runtime socket found. Start Docker, `podman.socket`, or set `DOCKER_HOST`.".to_string())
}

fn validate_docker_host(docker_host: &str) -> Result<(), String> {
    let path = docker_host.strip_prefix("unix://").unwrap_or(docker_host);
    if !path.starts_with('/') {
        return Ok(());
    }
    if wait_for_socket(Path::new(path), SOCKET_WAIT_TIMEOUT) {
        Ok(())
    } else {
        Err(format!(
            "`DOCKER_HOST` points to `{docker_host}`, but the socket is not accepting connections."
        ))
    }
}

fn find_podman_socket() -> Option<PathBuf> {
    let mut candidates = Vec::new();
    if let Ok(runtime_dir) = env::var("XDG_RUNTIME_DIR") {
        candidates.push(PathBuf::from(runtime_dir).join("podman/podman.sock"));
    }
    candidates.push(PathBuf::from("/var/run/podman/podman.sock"));
    candidates.push(PathBuf::from("/run/podman/podman.sock"));

    candidates.into_iter().find(|path| path.exists())
}

fn wait_for_socket(path: &Path, timeout: Duration) -> bool {
    if !path.exists() {
        return false;
    }
    let start = Instant::now();
    while start.elapsed() < timeout {
        if UnixStream::connect(path).is_ok() {
            return true;
        }
        thread::sleep(Duration::from_millis(200));
    }
    false
}
