//! Test support utilities shared across unit and integration tests.

use std::collections::{BTreeMap, BTreeSet};
use std::env;
use std::ffi::OsString;
use std::io::{self, Read, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::{Arc, Mutex as StdMutex, PoisonError};
use std::thread::{self, JoinHandle};

use thiserror::Error;
use tokio::sync::{Mutex, MutexGuard};

use crate::backend::{
    BackendFuture, InstanceRequest, NetworkRequest, NicHandle, OwnerLabels, PowerAction,
    ProvisioningBackend, ResourceSummary,
};
use crate::network::IpRange;
use crate::plan::{Attachment, CreatedInstance, CreatedNetwork};
use crate::size::Size;

/// Backend operations that can be scripted to fail.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum Operation {
    /// `find_images`.
    FindImages,
    /// `create_instance`, targeted by instance name.
    CreateInstance,
    /// `create_network`, targeted by network name.
    CreateNetwork,
    /// `attach_network`, targeted by instance id.
    Attach,
    /// `list_instances`.
    ListInstances,
    /// `list_networks`.
    ListNetworks,
    /// `power`, targeted by instance id.
    Power,
    /// `destroy_instance`, targeted by instance id.
    DestroyInstance,
    /// `destroy_network`, targeted by network id.
    DestroyNetwork,
}

/// Error produced by [`ScriptedBackend`] for scripted failures.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
#[error("scripted failure in {operation:?} for {target}")]
pub struct ScriptedError {
    /// Operation that failed.
    pub operation: Operation,
    /// Name or id the operation targeted.
    pub target: String,
}

/// A call recorded by [`ScriptedBackend`].
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum BackendCall {
    /// Image lookup for the given labels.
    FindImages(Vec<String>),
    /// Instance creation.
    CreateInstance {
        /// Requested name.
        name: String,
        /// Requested size.
        size: Size,
        /// Labels attached to the instance.
        labels: BTreeMap<String, String>,
        /// Whether power-on was requested.
        autostart: bool,
    },
    /// Network creation.
    CreateNetwork {
        /// Requested name.
        name: String,
        /// Requested range.
        ip_range: Option<IpRange>,
        /// Labels attached to the network.
        labels: BTreeMap<String, String>,
    },
    /// Network attachment.
    Attach(Attachment),
    /// Power transition for an instance id.
    Power(String, PowerAction),
    /// Instance deletion by id.
    DestroyInstance(String),
    /// Network deletion by id.
    DestroyNetwork(String),
}

#[derive(Debug, Default)]
struct ScriptedState {
    images: BTreeSet<String>,
    instances: Vec<ResourceSummary>,
    networks: Vec<ResourceSummary>,
    power: BTreeMap<String, PowerAction>,
    failures: BTreeMap<Operation, Option<String>>,
    calls: Vec<BackendCall>,
    next_id: usize,
}

impl ScriptedState {
    fn next_id(&mut self, prefix: &str) -> String {
        self.next_id += 1;
        format!("{prefix}-{}", self.next_id)
    }

    fn check(&self, operation: Operation, target: &str) -> Result<(), ScriptedError> {
        match self.failures.get(&operation) {
            Some(None) => Err(ScriptedError {
                operation,
                target: target.to_owned(),
            }),
            Some(Some(expected)) if expected == target => Err(ScriptedError {
                operation,
                target: target.to_owned(),
            }),
            _ => Ok(()),
        }
    }
}

/// In-memory backend with sequential ids, call recording and scripted
/// failures.
///
/// Clones share state, so a test can keep a handle while an orchestrator owns
/// another.
#[derive(Clone, Debug, Default)]
pub struct ScriptedBackend {
    state: Arc<StdMutex<ScriptedState>>,
}

impl ScriptedBackend {
    /// Creates a backend with no images and no resources.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn with_state<T>(&self, f: impl FnOnce(&mut ScriptedState) -> T) -> T {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut state)
    }

    /// Makes `labels` resolvable by `find_images`.
    #[must_use]
    pub fn with_images<I, S>(self, labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.with_state(|state| state.images.extend(labels.into_iter().map(Into::into)));
        self
    }

    /// Adds an existing instance and returns its id.
    pub fn seed_instance(&self, name: &str, labels: &OwnerLabels) -> String {
        self.with_state(|state| {
            let id = state.next_id("srv");
            state.instances.push(ResourceSummary {
                id: id.clone(),
                name: name.to_owned(),
                labels: labels.to_map(),
                public_ip: None,
            });
            state.power.insert(id.clone(), PowerAction::Stop);
            id
        })
    }

    /// Adds an existing network and returns its id.
    pub fn seed_network(&self, name: &str, labels: &OwnerLabels) -> String {
        self.with_state(|state| {
            let id = state.next_id("pn");
            state.networks.push(ResourceSummary {
                id: id.clone(),
                name: name.to_owned(),
                labels: labels.to_map(),
                public_ip: None,
            });
            id
        })
    }

    /// Gives the instance named `name` a public address.
    pub fn set_public_ip(&self, name: &str, ip: impl Into<String>) {
        let ip = ip.into();
        self.with_state(|state| {
            for summary in state.instances.iter_mut().filter(|s| s.name == name) {
                summary.public_ip = Some(ip.clone());
            }
        });
    }

    /// Makes every call of `operation` fail.
    pub fn fail_always(&self, operation: Operation) {
        self.with_state(|state| {
            state.failures.insert(operation, None);
        });
    }

    /// Makes `operation` fail when it targets `target` (a name for creation,
    /// an id otherwise).
    pub fn fail_on(&self, operation: Operation, target: impl Into<String>) {
        self.with_state(|state| {
            state.failures.insert(operation, Some(target.into()));
        });
    }

    /// Returns every call recorded so far.
    #[must_use]
    pub fn calls(&self) -> Vec<BackendCall> {
        self.with_state(|state| state.calls.clone())
    }

    /// Returns the instances currently known to the backend.
    #[must_use]
    pub fn instances(&self) -> Vec<ResourceSummary> {
        self.with_state(|state| state.instances.clone())
    }

    /// Returns the networks currently known to the backend.
    #[must_use]
    pub fn networks(&self) -> Vec<ResourceSummary> {
        self.with_state(|state| state.networks.clone())
    }

    /// Returns the id of the instance named `name`.
    #[must_use]
    pub fn instance_id(&self, name: &str) -> Option<String> {
        self.with_state(|state| {
            state
                .instances
                .iter()
                .find(|summary| summary.name == name)
                .map(|summary| summary.id.clone())
        })
    }

    /// Returns the id of the network named `name`.
    #[must_use]
    pub fn network_id(&self, name: &str) -> Option<String> {
        self.with_state(|state| {
            state
                .networks
                .iter()
                .find(|summary| summary.name == name)
                .map(|summary| summary.id.clone())
        })
    }

    /// Returns the last power state of instance `id`.
    #[must_use]
    pub fn power_state(&self, id: &str) -> Option<PowerAction> {
        self.with_state(|state| state.power.get(id).copied())
    }

    /// Returns the recorded attachments.
    #[must_use]
    pub fn attachments(&self) -> Vec<Attachment> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                BackendCall::Attach(attachment) => Some(attachment),
                _ => None,
            })
            .collect()
    }
}

impl ProvisioningBackend for ScriptedBackend {
    type Error = ScriptedError;

    fn find_images<'a>(
        &'a self,
        labels: &'a [String],
    ) -> BackendFuture<'a, BTreeSet<String>, Self::Error> {
        Box::pin(async move {
            self.with_state(|state| -> Result<BTreeSet<String>, ScriptedError> {
                state.calls.push(BackendCall::FindImages(labels.to_vec()));
                state.check(Operation::FindImages, "")?;
                Ok(labels
                    .iter()
                    .filter(|label| state.images.contains(*label))
                    .cloned()
                    .collect())
            })
        })
    }

    fn create_instance<'a>(
        &'a self,
        request: &'a InstanceRequest,
    ) -> BackendFuture<'a, CreatedInstance, Self::Error> {
        Box::pin(async move {
            self.with_state(|state| -> Result<CreatedInstance, ScriptedError> {
                let labels = request.labels.to_map();
                state.calls.push(BackendCall::CreateInstance {
                    name: request.name.clone(),
                    size: request.size,
                    labels: labels.clone(),
                    autostart: request.autostart,
                });
                state.check(Operation::CreateInstance, &request.name)?;
                let id = state.next_id("srv");
                state.instances.push(ResourceSummary {
                    id: id.clone(),
                    name: request.name.clone(),
                    labels,
                    public_ip: None,
                });
                let power = if request.autostart {
                    PowerAction::Start
                } else {
                    PowerAction::Stop
                };
                state.power.insert(id.clone(), power);
                Ok(CreatedInstance {
                    canonical_name: request.name.clone(),
                    id,
                })
            })
        })
    }

    fn create_network<'a>(
        &'a self,
        request: &'a NetworkRequest,
    ) -> BackendFuture<'a, CreatedNetwork, Self::Error> {
        Box::pin(async move {
            self.with_state(|state| -> Result<CreatedNetwork, ScriptedError> {
                let labels = request.labels.to_map();
                state.calls.push(BackendCall::CreateNetwork {
                    name: request.name.clone(),
                    ip_range: request.ip_range.clone(),
                    labels: labels.clone(),
                });
                state.check(Operation::CreateNetwork, &request.name)?;
                let id = state.next_id("pn");
                state.networks.push(ResourceSummary {
                    id: id.clone(),
                    name: request.name.clone(),
                    labels,
                    public_ip: None,
                });
                Ok(CreatedNetwork {
                    canonical_name: request.name.clone(),
                    id,
                })
            })
        })
    }

    fn attach_network<'a>(
        &'a self,
        attachment: &'a Attachment,
    ) -> BackendFuture<'a, NicHandle, Self::Error> {
        Box::pin(async move {
            self.with_state(|state| -> Result<NicHandle, ScriptedError> {
                state.calls.push(BackendCall::Attach(attachment.clone()));
                state.check(Operation::Attach, &attachment.instance_id)?;
                Ok(NicHandle {
                    id: state.next_id("nic"),
                })
            })
        })
    }

    fn list_instances(&self) -> BackendFuture<'_, Vec<ResourceSummary>, Self::Error> {
        Box::pin(async move {
            self.with_state(|state| -> Result<Vec<ResourceSummary>, ScriptedError> {
                state.check(Operation::ListInstances, "")?;
                Ok(state.instances.clone())
            })
        })
    }

    fn list_networks(&self) -> BackendFuture<'_, Vec<ResourceSummary>, Self::Error> {
        Box::pin(async move {
            self.with_state(|state| -> Result<Vec<ResourceSummary>, ScriptedError> {
                state.check(Operation::ListNetworks, "")?;
                Ok(state.networks.clone())
            })
        })
    }

    fn power<'a>(&'a self, id: &'a str, action: PowerAction) -> BackendFuture<'a, (), Self::Error> {
        Box::pin(async move {
            self.with_state(|state| -> Result<(), ScriptedError> {
                state.calls.push(BackendCall::Power(id.to_owned(), action));
                state.check(Operation::Power, id)?;
                state.power.insert(id.to_owned(), action);
                Ok(())
            })
        })
    }

    fn destroy_instance<'a>(&'a self, id: &'a str) -> BackendFuture<'a, (), Self::Error> {
        Box::pin(async move {
            self.with_state(|state| -> Result<(), ScriptedError> {
                state.calls.push(BackendCall::DestroyInstance(id.to_owned()));
                state.check(Operation::DestroyInstance, id)?;
                state.instances.retain(|summary| summary.id != id);
                state.power.remove(id);
                Ok(())
            })
        })
    }

    fn destroy_network<'a>(&'a self, id: &'a str) -> BackendFuture<'a, (), Self::Error> {
        Box::pin(async move {
            self.with_state(|state| -> Result<(), ScriptedError> {
                state.calls.push(BackendCall::DestroyNetwork(id.to_owned()));
                state.check(Operation::DestroyNetwork, id)?;
                state.networks.retain(|summary| summary.id != id);
                Ok(())
            })
        })
    }
}

fn answer(mut stream: TcpStream, status_line: &str) -> io::Result<()> {
    let mut request: Vec<u8> = Vec::new();
    let mut chunk = [0_u8; 512];
    while !request.windows(4).any(|window| window == b"\r\n\r\n") {
        let read = stream.read(&mut chunk)?;
        if read == 0 {
            break;
        }
        request.extend(chunk.iter().take(read));
    }
    write!(
        stream,
        "{status_line}\r\nContent-Length: 0\r\nConnection: close\r\n\r\n"
    )?;
    stream.flush()
}

/// Answers `count` HTTP requests on a loopback port with `status_line` and an
/// empty body. Returns the `host:port` address and the server thread.
///
/// # Errors
///
/// Returns an I/O error when no loopback port can be bound.
pub fn serve_http(status_line: &'static str, count: usize) -> io::Result<(String, JoinHandle<()>)> {
    let listener = TcpListener::bind("127.0.0.1:0")?;
    let address = listener.local_addr()?.to_string();
    let server = thread::spawn(move || {
        for stream in listener.incoming().take(count) {
            let answered = stream.and_then(|conn| answer(conn, status_line));
            if let Err(err) = answered {
                tracing::debug!(error = %err, "test server connection failed");
            }
        }
    });
    Ok((address, server))
}

/// Global mutex used to serialise environment mutation in tests.
pub static ENV_LOCK: Mutex<()> = Mutex::const_new(());

/// Guard that holds the env mutex and restores variables on drop.
pub struct EnvGuard {
    previous: Vec<(String, Option<OsString>)>,
    _guard: MutexGuard<'static, ()>,
}

impl EnvGuard {
    /// Sets `pairs` and clears `unset` while holding a global mutex.
    pub async fn scoped(pairs: &[(&str, &str)], unset: &[&str]) -> Self {
        let guard = ENV_LOCK.lock().await;
        let mut previous = Vec::with_capacity(pairs.len() + unset.len());
        for (key, value) in pairs {
            previous.push(((*key).to_owned(), env::var_os(key)));
            // SAFETY: Environment mutation is serialised by `ENV_LOCK`, preventing races.
            unsafe { env::set_var(key, value) };
        }
        for key in unset {
            previous.push(((*key).to_owned(), env::var_os(key)));
            // SAFETY: Environment mutation is serialised by `ENV_LOCK`, preventing races.
            unsafe { env::remove_var(key) };
        }

        Self {
            previous,
            _guard: guard,
        }
    }
}

impl Drop for EnvGuard {
    fn drop(&mut self) {
        for (key, old) in self.previous.iter().rev() {
            // SAFETY: Environment mutation is serialised by holding `_guard`.
            unsafe {
                match old {
                    Some(val) => env::set_var(key, val),
                    None => env::remove_var(key),
                }
            }
        }
    }
}
