//! Client session: join, then shuttle between the terminal and the server.
//!
//! Decisions live in `on_command` and `on_server_message`, which return
//! `Effect`s; `run` only performs them.

use futures_util::stream::SplitSink;
use futures_util::{SinkExt, StreamExt};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

use parlor_common::ParlorError;
use parlor_core::{
    render_lobby, same_name, AgentOutput, ClientRequest, PresenceAgent, ServerMessage,
};

use crate::commands::{self, Command, HELP};

type Ws = WebSocketStream<MaybeTlsStream<TcpStream>>;
type WsSink = SplitSink<Ws, Message>;

/// Something the session loop should do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    Print(String),
    Request(ClientRequest),
    /// Leave after sending any preceding requests.
    Quit,
}

/// React to one line typed by the user.
pub fn on_command(agent: &PresenceAgent, command: Command) -> Vec<Effect> {
    match command {
        Command::Empty => vec![],
        Command::Help => vec![Effect::Print(HELP.to_string())],
        Command::Disconnect => vec![
            Effect::Request(ClientRequest::Disconnect),
            Effect::Print("Goodbye.".into()),
            Effect::Quit,
        ],
        Command::Return if agent.is_paired() => {
            vec![Effect::Request(ClientRequest::ReturnToLobby)]
        }
        Command::Return => vec![Effect::Print(
            "You are already in the lobby. Type $help to see what you can do.".into(),
        )],
        Command::PairWith(_) if agent.is_paired() => vec![Effect::Print(
            "You are already in a conversation. Type $return first.".into(),
        )],
        Command::PairWith(name) if same_name(&name, agent.name()) => vec![Effect::Print(
            "You cannot chat with yourself. Pick someone from the available list.".into(),
        )],
        Command::PairWith(name) => vec![Effect::Request(ClientRequest::Pair { to: name })],
        Command::Say(text) if agent.is_paired() => {
            vec![Effect::Request(ClientRequest::Send { text })]
        }
        Command::Say(_) => vec![Effect::Print(
            "You are in the lobby. Type $<name> to start a conversation.".into(),
        )],
    }
}

/// React to one frame from the server.
pub fn on_server_message(agent: &mut PresenceAgent, message: ServerMessage) -> Vec<Effect> {
    let reply = match message.into_notification() {
        Ok(notification) => return agent_effects(agent.handle(notification)),
        Err(reply) => reply,
    };

    match reply {
        ServerMessage::Lobby { available, busy } => {
            vec![Effect::Print(render_lobby(&parlor_core::LobbyView {
                available,
                busy,
            }))]
        }
        ServerMessage::PairResult {
            to, paired: true, ..
        } => agent_effects(agent.paired_with(&to)),
        ServerMessage::PairResult { to, reason, .. } => vec![Effect::Print(format!(
            "Could not start a conversation with {to}: {}.",
            reason.as_deref().unwrap_or("make sure that user exists and is available")
        ))],
        ServerMessage::NotPaired => agent_effects(agent.not_paired()),
        ServerMessage::Error { message } => {
            tracing::warn!(message = %message, "Server reported an error");
            vec![Effect::Print(format!("Server error: {message}"))]
        }
        other => {
            tracing::debug!(message = ?other, "Ignoring server frame");
            vec![]
        }
    }
}

fn agent_effects(outputs: Vec<AgentOutput>) -> Vec<Effect> {
    outputs
        .into_iter()
        .map(|output| match output {
            AgentOutput::Show(line) => Effect::Print(line),
            AgentOutput::RefreshLobby => Effect::Request(ClientRequest::Lobby),
        })
        .collect()
}

/// Connect, join and run until the user disconnects or the server goes away.
pub async fn run(url: &str, name: Option<String>) -> Result<(), ParlorError> {
    tracing::info!(url = %url, "Connecting");
    let (ws, _) = connect_async(url)
        .await
        .map_err(|e| ParlorError::Network(format!("connect to {url} failed: {e}")))?;
    let (mut sink, mut stream) = ws.split();
    let mut input = BufReader::new(tokio::io::stdin()).lines();

    // 1. Join, prompting until the server accepts a name.
    let mut candidate = name;
    let me = loop {
        let name = match candidate.take() {
            Some(name) => name,
            None => {
                println!("Please enter your name:");
                match input.next_line().await? {
                    Some(line) if line.trim().is_empty() => continue,
                    Some(line) => line.trim().to_string(),
                    None => return Ok(()),
                }
            }
        };

        send(&mut sink, &ClientRequest::Join { name: name.clone() }).await?;
        match wait_for_join(&mut stream).await? {
            (true, _) => break name,
            (false, reason) => println!(
                "Could not join as {name}: {}. Please choose another name.",
                reason.as_deref().unwrap_or("name rejected")
            ),
        }
    };

    let mut agent = PresenceAgent::new(me.clone());
    println!("Welcome to the chat room, {me}!");
    println!("{HELP}");
    send(&mut sink, &ClientRequest::Lobby).await?;

    // 2. Main loop.
    loop {
        let effects = tokio::select! {
            line = input.next_line() => match line? {
                Some(line) => on_command(&agent, commands::parse(&line)),
                None => on_command(&agent, Command::Disconnect),
            },

            frame = stream.next() => match frame {
                Some(Ok(Message::Text(text))) => match serde_json::from_str::<ServerMessage>(&text) {
                    Ok(message) => on_server_message(&mut agent, message),
                    Err(e) => {
                        tracing::warn!(error = %e, "Unreadable server frame");
                        vec![]
                    }
                },
                Some(Ok(Message::Ping(data))) => {
                    let _ = sink.send(Message::Pong(data)).await;
                    vec![]
                }
                Some(Ok(Message::Close(_))) | None => {
                    agent.disconnected();
                    println!("The server closed the connection.");
                    return Ok(());
                }
                Some(Err(e)) => {
                    agent.disconnected();
                    return Err(ParlorError::Network(e.to_string()));
                }
                _ => vec![],
            },
        };

        for effect in effects {
            match effect {
                Effect::Print(line) => println!("{line}"),
                Effect::Request(request) => send(&mut sink, &request).await?,
                Effect::Quit => {
                    agent.disconnected();
                    let _ = sink.close().await;
                    return Ok(());
                }
            }
        }
    }
}

async fn wait_for_join(
    stream: &mut futures_util::stream::SplitStream<Ws>,
) -> Result<(bool, Option<String>), ParlorError> {
    while let Some(frame) = stream.next().await {
        let frame = frame.map_err(|e| ParlorError::Network(e.to_string()))?;
        if let Message::Text(text) = frame {
            if let ServerMessage::JoinResult { joined, reason } = serde_json::from_str::<ServerMessage>(&text)? {
                return Ok((joined, reason));
            }
        }
    }
    Err(ParlorError::Network("server closed the connection during join".into()))
}

async fn send(sink: &mut WsSink, request: &ClientRequest) -> Result<(), ParlorError> {
    let json = serde_json::to_string(request)?;
    sink.send(Message::Text(json.into()))
        .await
        .map_err(|e| ParlorError::Network(e.to_string()))
}
