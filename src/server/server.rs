use crate::application_impl::*;
use crate::application_port::*;
use crate::domain_port::*;
use crate::infra_memory::*;
use crate::infra_mysql::*;
use crate::logger::*;
use crate::server::*;
use crate::settings::Settings;
use chrono::Duration as ChronoDuration;
use nanoid::nanoid;
use sqlx::MySqlPool;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Where the repositories keep their data.
pub enum Storage {
    Memory(Arc<MemoryStore>),
    MySql(MySqlPool),
}

impl Storage {
    pub async fn from_settings(settings: &Settings) -> anyhow::Result<Storage> {
        match settings.storage.backend.as_str() {
            "memory" => {
                let store = Arc::new(MemoryStore::new());
                if let Some(path) = &settings.storage.seed_path {
                    store.apply_seed(Seed::load(Path::new(path)).await?);
                }
                Ok(Storage::Memory(store))
            }
            "mysql" => Ok(Storage::MySql(
                MySqlPool::connect(&settings.storage.mysql_dsn).await?,
            )),
            other => Err(anyhow::anyhow!("Unknown storage backend: {}", other)),
        }
    }
}

struct Repos {
    user: Arc<dyn UserRepo>,
    post: Arc<dyn PostRepo>,
    contact: Arc<dyn ContactRequestRepo>,
    conversation: Arc<dyn ConversationRepo>,
    message: Arc<dyn MessageRepo>,
    notification: Arc<dyn NotificationRepo>,
}

impl Repos {
    fn new(storage: &Storage) -> Repos {
        match storage {
            Storage::Memory(store) => Repos {
                user: store.clone(),
                post: store.clone(),
                contact: store.clone(),
                conversation: store.clone(),
                message: store.clone(),
                notification: store.clone(),
            },
            Storage::MySql(pool) => Repos {
                user: Arc::new(MySqlUserRepo::new(pool.clone())),
                post: Arc::new(MySqlPostRepo::new(pool.clone())),
                contact: Arc::new(MySqlContactRequestRepo::new(pool.clone())),
                conversation: Arc::new(MySqlConversationRepo::new(pool.clone())),
                message: Arc::new(MySqlMessageRepo::new(pool.clone())),
                notification: Arc::new(MySqlNotificationRepo::new(pool.clone())),
            },
        }
    }
}

pub struct Server {
    pub token_verifier: Arc<dyn TokenVerifier>,
    pub user_service: Arc<dyn UserService>,
    pub contact_service: Arc<dyn ContactService>,
    pub chat_service: Arc<dyn ChatService>,
    pub notification_service: Arc<dyn NotificationService>,
    pub feed_service: Arc<dyn FeedService>,
    pub connection_acceptor: Arc<dyn ConnectionAcceptor>,
    pub session_hub: Arc<SessionHub>,
    background: Mutex<Vec<JoinHandle<()>>>,
    cancel: CancellationToken,
    pool: Option<MySqlPool>,
}

impl Server {
    pub async fn try_new(settings: &Settings) -> anyhow::Result<Self> {
        let storage = Storage::from_settings(settings).await?;
        Self::with_storage(settings, storage).await
    }

    pub async fn with_storage(settings: &Settings, storage: Storage) -> anyhow::Result<Self> {
        let alphabet: [char; 16] = [
            '1', '2', '3', '4', '5', '6', '7', '8', '9', '0', 'a', 'b', 'c', 'd', 'e', 'f',
        ];
        let run_id = nanoid!(10, &alphabet);

        let repos = Repos::new(&storage);
        let pool = match storage {
            Storage::MySql(pool) => Some(pool),
            Storage::Memory(_) => None,
        };

        let token_verifier: Arc<dyn TokenVerifier> = match settings.auth.backend.as_str() {
            "fake" => Arc::new(FakeTokenVerifier::new()),
            "jwt" => {
                let key = std::env::var(&settings.auth.signing_key_env).map_err(|_| {
                    anyhow::anyhow!("{} is not set", settings.auth.signing_key_env)
                })?;
                Arc::new(JwtHs256Verifier::new(JwtConfig {
                    issuer: settings.auth.issuer.clone(),
                    audience: settings.auth.audience.clone(),
                    signing_key: key.into_bytes(),
                }))
            }
            other => return Err(anyhow::anyhow!("Unknown auth backend: {}", other)),
        };

        // region runtime infra
        let cancel = CancellationToken::new();
        let mut background = Vec::new();

        let local_rooms = Arc::new(LocalRooms::new());
        let room_broker: Arc<dyn RoomBroker> = match settings.realtime.backend.as_str() {
            "local" => local_rooms.clone(),
            #[cfg(feature = "kafka")]
            "kafka" => {
                let bootstrap = settings.realtime.kafka_bootstrap.as_str();
                let publisher: Arc<dyn EventPublisher> = Arc::new(KafkaPublisher::new(
                    bootstrap,
                    &format!("tradepost-pub-{}", run_id),
                )?);
                let consumer: Arc<dyn EventConsumer> = Arc::new(KafkaConsumer::new(
                    bootstrap,
                    &format!("tradepost-sub-{}", run_id),
                    cancel.clone(),
                ));
                let fanout_handler: Arc<dyn EventHandler> =
                    Arc::new(RoomFanoutHandler::new(local_rooms.clone()));

                let group = format!("room-fanout-{}", run_id);
                background.push(tokio::spawn(async move {
                    if let Err(e) = consumer
                        .run(&group, &[ROOM_EVENTS_TOPIC], fanout_handler)
                        .await
                    {
                        error!("room fan-out consumer stopped: {e:#}");
                    }
                }));

                Arc::new(BackplaneRoomBroker::new(
                    local_rooms.clone(),
                    publisher,
                    ROOM_EVENTS_TOPIC,
                ))
            }
            #[cfg(not(feature = "kafka"))]
            "kafka" => {
                return Err(anyhow::anyhow!(
                    "realtime backend \"kafka\" needs the `kafka` cargo feature"
                ));
            }
            other => return Err(anyhow::anyhow!("Unknown realtime backend: {}", other)),
        };
        // endregion

        let content_safety: Arc<dyn ContentSafety> = Arc::new(WordListContentSafety::new(
            &settings.moderation.blocked_words,
        ));

        let user_service: Arc<dyn UserService> = Arc::new(RealUserService::new(repos.user.clone()));

        let notification_service: Arc<dyn NotificationService> = Arc::new(
            RealNotificationService::new(repos.notification.clone(), room_broker.clone()),
        );

        let chat_service: Arc<dyn ChatService> = Arc::new(RealChatService::new(
            repos.conversation.clone(),
            repos.message.clone(),
            repos.contact.clone(),
            repos.user.clone(),
            content_safety,
            room_broker.clone(),
        ));

        let policy = ContactPolicy {
            request_ttl: ChronoDuration::hours(settings.contact.request_ttl_hours.into()),
            cooldown: ChronoDuration::hours(settings.contact.cooldown_hours.into()),
        };
        let contact_service: Arc<dyn ContactService> = Arc::new(RealContactService::new(
            repos.contact.clone(),
            repos.post.clone(),
            repos.user.clone(),
            chat_service.clone(),
            notification_service.clone(),
            policy,
        ));

        let feed_service: Arc<dyn FeedService> =
            Arc::new(RealFeedService::new(repos.post.clone(), room_broker.clone()));

        let session_hub = Arc::new(SessionHub::new(
            local_rooms,
            room_broker,
            ServiceRegistry {
                chat_service: chat_service.clone(),
            },
            ActorConfig::default(),
        ));
        let connection_acceptor: Arc<dyn ConnectionAcceptor> = session_hub.clone();

        if settings.contact.sweep_interval_secs > 0 {
            let sweeper = ExpirySweeper::new(
                contact_service.clone(),
                Duration::from_secs(settings.contact.sweep_interval_secs),
                cancel.clone(),
            );
            background.push(tokio::spawn(async move {
                let _ = sweeper.run().await;
            }));
        }

        info!(%run_id, storage = %settings.storage.backend, realtime = %settings.realtime.backend, "server started");

        Ok(Self {
            token_verifier,
            user_service,
            contact_service,
            chat_service,
            notification_service,
            feed_service,
            connection_acceptor,
            session_hub,
            background: Mutex::new(background),
            cancel,
            pool,
        })
    }

    pub async fn shutdown(&self) {
        info!("server shutting down...");

        self.cancel.cancel();

        let handles = match self.background.lock() {
            Ok(mut lock) => std::mem::take(&mut *lock),
            Err(_) => Vec::new(),
        };
        for handle in handles {
            let r = handle.await;
            info!("background task dropped: {:?}", r);
        }

        self.session_hub.shutdown().await;
        if let Some(pool) = &self.pool {
            pool.close().await;
        }
    }
}
