use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::{Mutex, mpsc};
use tracing::debug;
use webrtc::api::APIBuilder;
use webrtc::api::interceptor_registry::register_default_interceptors;
use webrtc::api::media_engine::{MIME_TYPE_OPUS, MIME_TYPE_VP8, MediaEngine};
use webrtc::ice_transport::ice_candidate::{RTCIceCandidate, RTCIceCandidateInit};
use webrtc::ice_transport::ice_server::RTCIceServer;
use webrtc::interceptor::registry::Registry;
use webrtc::media::Sample;
use webrtc::peer_connection::RTCPeerConnection;
use webrtc::peer_connection::configuration::RTCConfiguration;
use webrtc::peer_connection::peer_connection_state::RTCPeerConnectionState;
use webrtc::peer_connection::sdp::session_description::RTCSessionDescription;
use webrtc::rtp_transceiver::rtp_codec::RTCRtpCodecCapability;
use webrtc::rtp_transceiver::rtp_sender::RTCRtpSender;
use webrtc::track::track_local::TrackLocal;
use webrtc::track::track_local::track_local_static_sample::TrackLocalStaticSample;
use webrtc::track::track_remote::TrackRemote;

use huddle_core::IceServerConfig;

use crate::backend::media_backend::{MediaBackend, NegotiationSession};
use crate::error::MediaError;
use crate::media::{LocalMedia, MediaTrack, TrackKind};
use crate::session::{SessionEvent, TransportState};

/// Sample-fed local track. The embedder pushes encoded frames through
/// [`write_sample`]; a disabled track drops them, which mutes the outgoing
/// stream without renegotiation.
///
/// [`write_sample`]: NativeTrack::write_sample
#[derive(Clone)]
pub struct NativeTrack {
    inner: Arc<TrackLocalStaticSample>,
    kind: TrackKind,
    enabled: Arc<AtomicBool>,
}

impl NativeTrack {
    fn new(kind: TrackKind, codec: RTCRtpCodecCapability, id: &str) -> Self {
        Self {
            inner: Arc::new(TrackLocalStaticSample::new(
                codec,
                id.to_owned(),
                "huddle".to_owned(),
            )),
            kind,
            enabled: Arc::new(AtomicBool::new(true)),
        }
    }

    pub async fn write_sample(&self, sample: &Sample) -> Result<()> {
        if !self.is_enabled() {
            return Ok(());
        }
        self.inner.write_sample(sample).await?;
        Ok(())
    }

    fn as_track_local(&self) -> Arc<dyn TrackLocal + Send + Sync> {
        Arc::clone(&self.inner) as Arc<dyn TrackLocal + Send + Sync>
    }
}

impl MediaTrack for NativeTrack {
    fn kind(&self) -> TrackKind {
        self.kind
    }

    fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::SeqCst);
    }

    fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::SeqCst)
    }

    fn stop(&self) {
        self.enabled.store(false, Ordering::SeqCst);
    }
}

/// `MediaBackend` over the `webrtc` crate. Device IO lives with the
/// embedder; tracks produced here are sample sinks wired into the
/// negotiated session.
#[derive(Default)]
pub struct NativeBackend;

impl NativeBackend {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl MediaBackend for NativeBackend {
    type Track = NativeTrack;
    type RemoteTrack = Arc<TrackRemote>;
    type Session = NativeSession;

    async fn capture_camera(&self) -> Result<LocalMedia<NativeTrack>, MediaError> {
        let audio = NativeTrack::new(
            TrackKind::Audio,
            RTCRtpCodecCapability {
                mime_type: MIME_TYPE_OPUS.to_owned(),
                ..Default::default()
            },
            "audio",
        );
        let video = NativeTrack::new(
            TrackKind::Video,
            RTCRtpCodecCapability {
                mime_type: MIME_TYPE_VP8.to_owned(),
                ..Default::default()
            },
            "video",
        );
        Ok(LocalMedia::new(audio, video))
    }

    async fn capture_screen(&self) -> Result<NativeTrack, MediaError> {
        Ok(NativeTrack::new(
            TrackKind::Video,
            RTCRtpCodecCapability {
                mime_type: MIME_TYPE_VP8.to_owned(),
                ..Default::default()
            },
            "screen",
        ))
    }

    async fn open_session(
        &self,
        ice_servers: &[IceServerConfig],
        local: Option<&LocalMedia<NativeTrack>>,
        events: mpsc::UnboundedSender<SessionEvent<Arc<TrackRemote>>>,
    ) -> Result<NativeSession> {
        NativeSession::open(ice_servers, local, events).await
    }
}

pub struct NativeSession {
    peer_connection: Arc<RTCPeerConnection>,
    video_sender: Mutex<Option<Arc<RTCRtpSender>>>,
}

impl NativeSession {
    async fn open(
        ice_servers: &[IceServerConfig],
        local: Option<&LocalMedia<NativeTrack>>,
        events: mpsc::UnboundedSender<SessionEvent<Arc<TrackRemote>>>,
    ) -> Result<Self> {
        let mut media_engine = MediaEngine::default();
        media_engine.register_default_codecs()?;
        let registry = register_default_interceptors(Registry::new(), &mut media_engine)?;

        let api = APIBuilder::new()
            .with_media_engine(media_engine)
            .with_interceptor_registry(registry)
            .build();

        let rtc_config = RTCConfiguration {
            ice_servers: ice_servers
                .iter()
                .map(|server| RTCIceServer {
                    urls: server.urls.clone(),
                    username: server.username.clone().unwrap_or_default(),
                    credential: server.credential.clone().unwrap_or_default(),
                })
                .collect(),
            ..Default::default()
        };

        let peer_connection = Arc::new(api.new_peer_connection(rtc_config).await?);

        let state_tx = events.clone();
        peer_connection.on_peer_connection_state_change(Box::new(
            move |state: RTCPeerConnectionState| {
                let tx = state_tx.clone();
                Box::pin(async move {
                    debug!("peer connection state changed: {state:?}");
                    let _ = tx.send(SessionEvent::StateChanged(map_state(state)));
                })
            },
        ));

        let ice_tx = events.clone();
        peer_connection.on_ice_candidate(Box::new(move |candidate: Option<RTCIceCandidate>| {
            let tx = ice_tx.clone();
            Box::pin(async move {
                let Some(candidate) = candidate else { return };
                let Ok(init) = candidate.to_json() else {
                    return;
                };
                let Ok(value) = serde_json::to_value(&init) else {
                    return;
                };
                let _ = tx.send(SessionEvent::CandidateReady(value));
            })
        }));

        let track_tx = events.clone();
        peer_connection.on_track(Box::new(move |track, _receiver, _transceiver| {
            let tx = track_tx.clone();
            Box::pin(async move {
                debug!("remote track attached: {}", track.id());
                let _ = tx.send(SessionEvent::RemoteTrack(track));
            })
        }));

        let mut video_sender = None;
        if let Some(local) = local {
            peer_connection.add_track(local.audio.as_track_local()).await?;
            video_sender = Some(peer_connection.add_track(local.video.as_track_local()).await?);
        }

        Ok(Self {
            peer_connection,
            video_sender: Mutex::new(video_sender),
        })
    }
}

#[async_trait]
impl NegotiationSession for NativeSession {
    type Track = NativeTrack;

    async fn create_offer(&self) -> Result<Value> {
        let offer = self.peer_connection.create_offer(None).await?;
        self.peer_connection
            .set_local_description(offer.clone())
            .await?;
        Ok(serde_json::to_value(&offer)?)
    }

    async fn create_answer(&self) -> Result<Value> {
        let answer = self.peer_connection.create_answer(None).await?;
        self.peer_connection
            .set_local_description(answer.clone())
            .await?;
        Ok(serde_json::to_value(&answer)?)
    }

    async fn set_remote_description(&self, description: Value) -> Result<()> {
        let description: RTCSessionDescription =
            serde_json::from_value(description).context("malformed session description")?;
        self.peer_connection
            .set_remote_description(description)
            .await?;
        Ok(())
    }

    async fn add_ice_candidate(&self, candidate: Value) -> Result<()> {
        let candidate: RTCIceCandidateInit =
            serde_json::from_value(candidate).context("malformed ice candidate")?;
        self.peer_connection.add_ice_candidate(candidate).await?;
        Ok(())
    }

    async fn replace_video_track(&self, track: &NativeTrack) -> Result<()> {
        let sender = self
            .video_sender
            .lock()
            .await
            .clone()
            .context("no outgoing video sender")?;
        sender.replace_track(Some(track.as_track_local())).await?;
        Ok(())
    }

    async fn close(&self) -> Result<()> {
        self.peer_connection.close().await?;
        Ok(())
    }
}

fn map_state(state: RTCPeerConnectionState) -> TransportState {
    match state {
        RTCPeerConnectionState::New => TransportState::New,
        RTCPeerConnectionState::Connecting => TransportState::Connecting,
        RTCPeerConnectionState::Connected => TransportState::Connected,
        RTCPeerConnectionState::Disconnected => TransportState::Disconnected,
        RTCPeerConnectionState::Failed => TransportState::Failed,
        RTCPeerConnectionState::Closed => TransportState::Closed,
        _ => TransportState::New,
    }
}
