//! Typed wrappers for the server values the lifecycle helpers pass around.

macro_rules! newtype {
    ($name:ident) => {
        #[derive(Clone, Debug, Eq, PartialEq)]
        pub(crate) struct $name(String);

        impl $name {
            pub(crate) const fn as_str(&self) -> &str {
                self.0.as_str()
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self(value)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_owned())
            }
        }
    };
}

newtype!(InstanceId);
newtype!(InstanceState);
newtype!(Action);

impl InstanceState {
    /// Server is booted.
    pub(crate) const RUNNING: &'static str = "running";
    /// Server is powered off and still allocated.
    pub(crate) const STOPPED: &'static str = "stopped";

    pub(crate) fn is(&self, state: &str) -> bool {
        self.as_str() == state
    }
}

impl Action {
    /// Boots a stopped server.
    pub(crate) const POWER_ON: &'static str = "poweron";
    /// Shuts a running server down.
    pub(crate) const POWER_OFF: &'static str = "poweroff";
    /// Stops a server and deletes it with its volumes.
    pub(crate) const TERMINATE: &'static str = "terminate";

    pub(crate) fn is(&self, action: &str) -> bool {
        self.as_str() == action
    }
}
