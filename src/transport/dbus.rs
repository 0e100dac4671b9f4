use async_trait::async_trait;
use futures::{StreamExt, stream::BoxStream};
use tracing::{debug, instrument, warn};
use zbus::{Connection, fdo, proxy::CacheProperties, zvariant::ObjectPath};

use super::{
    PlayerConnection, RegistrationEvent, Transport,
    proxy::{MediaPlayer2PlayerProxy, MediaPlayer2Proxy},
};
use crate::{
    error::ControlError,
    types::{PLAYER_BUS_PREFIX, PlaybackState, PlayerId, TrackMetadata},
};

/// Session bus transport backed by zbus.
///
/// Probes build throwaway uncached proxies so no signal match or property
/// cache outlives the query; only [`Transport::connect`] produces a handle
/// that persists.
#[derive(Clone)]
pub struct DbusTransport {
    connection: Connection,
}

impl DbusTransport {
    /// Connect to the D-Bus session bus.
    ///
    /// # Errors
    /// Returns `ControlError::InitializationFailed` if the session bus is
    /// unreachable.
    pub async fn session() -> Result<Self, ControlError> {
        let connection = Connection::session().await.map_err(|e| {
            ControlError::InitializationFailed(format!("D-Bus connection failed: {e}"))
        })?;
        Ok(Self { connection })
    }

    async fn player_proxy(
        &self,
        id: &PlayerId,
    ) -> Result<MediaPlayer2PlayerProxy<'static>, ControlError> {
        let proxy = MediaPlayer2PlayerProxy::builder(&self.connection)
            .destination(id.bus_name().to_string())?
            .cache_properties(CacheProperties::No)
            .build()
            .await?;
        Ok(proxy)
    }

    async fn base_proxy(&self, id: &PlayerId) -> Result<MediaPlayer2Proxy<'static>, ControlError> {
        let proxy = MediaPlayer2Proxy::builder(&self.connection)
            .destination(id.bus_name().to_string())?
            .cache_properties(CacheProperties::No)
            .build()
            .await?;
        Ok(proxy)
    }
}

#[async_trait]
impl Transport for DbusTransport {
    async fn list_names(&self) -> Vec<String> {
        let dbus_proxy = match fdo::DBusProxy::new(&self.connection).await {
            Ok(proxy) => proxy,
            Err(e) => {
                warn!("DBus proxy creation failed: {e}");
                return Vec::new();
            }
        };

        match dbus_proxy.list_names().await {
            Ok(names) => names.iter().map(|name| name.to_string()).collect(),
            Err(e) => {
                warn!("Bus name enumeration failed: {e}");
                Vec::new()
            }
        }
    }

    async fn probe_status(&self, id: &PlayerId) -> Result<PlaybackState, ControlError> {
        let proxy = self.player_proxy(id).await?;
        let status = proxy.playback_status().await?;
        Ok(PlaybackState::from(status.as_str()))
    }

    async fn identity(&self, id: &PlayerId) -> Result<String, ControlError> {
        let proxy = self.base_proxy(id).await?;
        Ok(proxy.identity().await?)
    }

    async fn desktop_entry(&self, id: &PlayerId) -> Result<String, ControlError> {
        let proxy = self.base_proxy(id).await?;
        Ok(proxy.desktop_entry().await?)
    }

    #[instrument(skip(self), fields(bus_name = %id.bus_name()))]
    async fn connect(&self, id: &PlayerId) -> Result<Box<dyn PlayerConnection>, ControlError> {
        let proxy = self.player_proxy(id).await?;

        // Validity check: a name that no longer has an owner fails here
        // instead of lingering as a dead connection.
        proxy.playback_status().await?;

        debug!("Bound player connection");
        Ok(Box::new(DbusPlayerConnection { proxy }))
    }

    async fn registration_events(
        &self,
    ) -> Result<BoxStream<'static, RegistrationEvent>, ControlError> {
        let dbus_proxy = fdo::DBusProxy::new(&self.connection).await.map_err(|e| {
            ControlError::InitializationFailed(format!("DBus proxy failed: {e}"))
        })?;

        let name_owner_changed = dbus_proxy.receive_name_owner_changed().await.map_err(|e| {
            ControlError::InitializationFailed(format!("Signal subscription failed: {e}"))
        })?;

        let events = name_owner_changed.filter_map(|signal| {
            let event = signal.args().ok().and_then(|args| {
                let name = args.name().to_string();
                if !name.starts_with(PLAYER_BUS_PREFIX) {
                    return None;
                }

                match (args.old_owner().as_deref(), args.new_owner().as_deref()) {
                    (None, Some(_)) => Some(RegistrationEvent::Registered(name)),
                    (Some(_), None) => Some(RegistrationEvent::Unregistered(name)),
                    _ => None,
                }
            });
            async move { event }
        });

        Ok(events.boxed())
    }
}

struct DbusPlayerConnection {
    proxy: MediaPlayer2PlayerProxy<'static>,
}

#[async_trait]
impl PlayerConnection for DbusPlayerConnection {
    async fn playback_status(&self) -> Result<PlaybackState, ControlError> {
        let status = self.proxy.playback_status().await?;
        Ok(PlaybackState::from(status.as_str()))
    }

    async fn metadata(&self) -> Result<TrackMetadata, ControlError> {
        let metadata_map = self.proxy.metadata().await?;
        Ok(TrackMetadata::from(metadata_map))
    }

    async fn position_us(&self) -> Result<i64, ControlError> {
        Ok(self.proxy.position().await?)
    }

    async fn play(&self) -> Result<(), ControlError> {
        Ok(self.proxy.play().await?)
    }

    async fn pause(&self) -> Result<(), ControlError> {
        Ok(self.proxy.pause().await?)
    }

    async fn previous(&self) -> Result<(), ControlError> {
        Ok(self.proxy.previous().await?)
    }

    async fn next(&self) -> Result<(), ControlError> {
        Ok(self.proxy.next().await?)
    }

    async fn set_position(&self, track_id: &str, position_us: i64) -> Result<(), ControlError> {
        let track_id = ObjectPath::try_from(track_id).map_err(zbus::Error::from)?;
        Ok(self.proxy.set_position(&track_id, position_us).await?)
    }
}
