//! Handling of commands sent by the host.

use std::path::Path;
use std::sync::Arc;

use dl_kernel_common::{HostMessage, KernelMessage, ReplyBody};
use tokio::sync::mpsc;

use crate::context::KernelContext;
use crate::error::{Error, Result};

/// Answer host commands until the host asks to shut down or the command
/// channel closes.
pub async fn run_command_loop(
    ctx: Arc<KernelContext>,
    mut commands: mpsc::Receiver<HostMessage>,
) -> Result<()> {
    while let Some(message) = commands.recv().await {
        if matches!(message, HostMessage::Shutdown) {
            tracing::info!("Host requested shutdown");
            return Ok(());
        }

        if let Some(reply) = handle_command(&ctx, message).await {
            ctx.gateway
                .send_to_host(reply)
                .await
                .map_err(Error::Transmit)?;
        }
    }

    tracing::info!("Command channel closed");
    Ok(())
}

/// Handle one host command, returning the message to send back.
pub async fn handle_command(ctx: &KernelContext, message: HostMessage) -> Option<KernelMessage> {
    match message {
        HostMessage::ListNetworkTypes { request_id } => {
            let network_types = ctx.network_types.infos().await;
            Some(to_reply(request_id, Ok(ReplyBody::NetworkTypes { network_types })))
        }

        HostMessage::ResolveModelType {
            request_id,
            type_name,
        } => {
            let result = ctx
                .network_types
                .resolve_type_name(&type_name)
                .await
                .map(|network_type| ReplyBody::Resolved {
                    identifier: network_type.identifier().to_string(),
                });
            Some(to_reply(request_id, result))
        }

        HostMessage::ReadNetwork {
            request_id,
            network_type,
            path,
        } => {
            let result = read_network(ctx, &network_type, Path::new(&path)).await;
            Some(to_reply(request_id, result))
        }

        HostMessage::DataResponse { request_id, .. } | HostMessage::DataError { request_id, .. } => {
            tracing::warn!("Ignoring data reply {} outside of a request", request_id);
            None
        }

        HostMessage::Shutdown => None,
    }
}

async fn read_network(ctx: &KernelContext, identifier: &str, path: &Path) -> Result<ReplyBody> {
    let network_type = ctx.network_types.lookup_by_id(identifier).await?;
    let network = network_type.reader().read(path).await?;
    let spec = network.spec()?;
    tracing::info!("Read {} network from {}", identifier, path.display());
    Ok(ReplyBody::NetworkSpec { spec })
}

fn to_reply(request_id: String, result: Result<ReplyBody>) -> KernelMessage {
    match result {
        Ok(body) => KernelMessage::Reply { request_id, body },
        Err(e) => {
            tracing::warn!(request_id = %request_id, code = e.code(), "Command failed: {}", e);
            KernelMessage::Error {
                request_id,
                code: e.code().to_string(),
                message: e.to_string(),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Config, NetworkTypeConfig};
    use crate::error::TransmitError;
    use crate::gateway::{HostGateway, Transmit, Workspace};
    use crate::network_type::NetworkTypeRegistry;
    use async_trait::async_trait;
    use std::sync::Mutex as StdMutex;

    #[derive(Default)]
    struct CollectingTransmit {
        sent: StdMutex<Vec<KernelMessage>>,
    }

    #[async_trait]
    impl Transmit for CollectingTransmit {
        async fn transmit(
            &self,
            message: KernelMessage,
        ) -> std::result::Result<Option<HostMessage>, TransmitError> {
            self.sent.lock().unwrap().push(message);
            Ok(None)
        }
    }

    async fn test_context(transmit: Arc<CollectingTransmit>) -> Arc<KernelContext> {
        let config = Config {
            network_types: vec![
                NetworkTypeConfig {
                    identifier: "keras".to_string(),
                    backend_module_names: vec!["keras.".to_string()],
                },
                NetworkTypeConfig {
                    identifier: "onnx".to_string(),
                    backend_module_names: vec!["onnx.".to_string()],
                },
            ],
            ..Config::default()
        };
        let gateway = Arc::new(HostGateway::new(Arc::new(Workspace::new()), transmit));
        let ctx = KernelContext::new(config, Arc::new(NetworkTypeRegistry::new()), gateway);
        ctx.register_declared_network_types().await.unwrap();
        Arc::new(ctx)
    }

    #[tokio::test]
    async fn test_list_network_types() {
        let ctx = test_context(Arc::new(CollectingTransmit::default())).await;
        let reply = handle_command(
            &ctx,
            HostMessage::ListNetworkTypes {
                request_id: "1".to_string(),
            },
        )
        .await
        .unwrap();

        match reply {
            KernelMessage::Reply {
                request_id,
                body: ReplyBody::NetworkTypes { network_types },
            } => {
                assert_eq!(request_id, "1");
                let ids: Vec<&str> = network_types.iter().map(|n| n.identifier.as_str()).collect();
                assert_eq!(ids, vec!["keras", "onnx"]);
            }
            other => panic!("unexpected reply: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_resolve_model_type() {
        let ctx = test_context(Arc::new(CollectingTransmit::default())).await;

        let reply = handle_command(
            &ctx,
            HostMessage::ResolveModelType {
                request_id: "2".to_string(),
                type_name: "onnx.ModelProto".to_string(),
            },
        )
        .await
        .unwrap();
        assert_eq!(
            reply,
            KernelMessage::Reply {
                request_id: "2".to_string(),
                body: ReplyBody::Resolved {
                    identifier: "onnx".to_string()
                },
            }
        );

        let reply = handle_command(
            &ctx,
            HostMessage::ResolveModelType {
                request_id: "3".to_string(),
                type_name: "sklearn.svm.SVC".to_string(),
            },
        )
        .await
        .unwrap();
        match reply {
            KernelMessage::Error { request_id, code, .. } => {
                assert_eq!(request_id, "3");
                assert_eq!(code, "unresolved_model_type");
            }
            other => panic!("unexpected reply: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_read_network_unknown_type() {
        let ctx = test_context(Arc::new(CollectingTransmit::default())).await;
        let reply = handle_command(
            &ctx,
            HostMessage::ReadNetwork {
                request_id: "4".to_string(),
                network_type: "pytorch".to_string(),
                path: "/tmp/model.json".to_string(),
            },
        )
        .await
        .unwrap();

        match reply {
            KernelMessage::Error { code, message, .. } => {
                assert_eq!(code, "unknown_identifier");
                assert!(message.contains("pytorch"));
            }
            other => panic!("unexpected reply: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_stray_data_reply_ignored() {
        let ctx = test_context(Arc::new(CollectingTransmit::default())).await;
        let reply = handle_command(
            &ctx,
            HostMessage::DataError {
                request_id: "5".to_string(),
                message: "late".to_string(),
            },
        )
        .await;
        assert!(reply.is_none());
    }

    #[tokio::test]
    async fn test_loop_replies_until_shutdown() {
        let transmit = Arc::new(CollectingTransmit::default());
        let ctx = test_context(transmit.clone()).await;
        let (tx, rx) = mpsc::channel(8);

        tx.send(HostMessage::ListNetworkTypes {
            request_id: "a".to_string(),
        })
        .await
        .unwrap();
        tx.send(HostMessage::Shutdown).await.unwrap();
        tx.send(HostMessage::ListNetworkTypes {
            request_id: "b".to_string(),
        })
        .await
        .unwrap();

        run_command_loop(ctx, rx).await.unwrap();

        let sent = transmit.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].request_id(), Some("a"));
    }

    #[tokio::test]
    async fn test_declared_duplicates_fail_startup() {
        let config = Config {
            network_types: vec![
                NetworkTypeConfig {
                    identifier: "keras".to_string(),
                    backend_module_names: vec!["keras.".to_string()],
                },
                NetworkTypeConfig {
                    identifier: "keras".to_string(),
                    backend_module_names: vec!["tf.keras.".to_string()],
                },
            ],
            ..Config::default()
        };
        let gateway = Arc::new(HostGateway::new(
            Arc::new(Workspace::new()),
            Arc::new(CollectingTransmit::default()),
        ));
        let ctx = KernelContext::new(config, Arc::new(NetworkTypeRegistry::new()), gateway);

        let err = ctx.register_declared_network_types().await.unwrap_err();
        assert!(matches!(err, Error::DuplicateIdentifier(_)));
    }
}
