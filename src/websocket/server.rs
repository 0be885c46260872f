//! `ChatServer` is an actor. It maintains the list of connected client
//! sessions and the group rooms, and relays chat messages between peers
//! in the same room. Messages are never persisted.

use crate::websocket::UserOperation;
use crate::{ConnectionId, GroupId, IPAddr, RantifyError};
use actix::prelude::*;
use log::{error, info};
use rand::{rngs::ThreadRng, Rng};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::str::FromStr;

/// Chat server sends this messages to session
#[derive(Message)]
#[rtype(result = "()")]
pub struct WSMessage(pub String);

/// New chat session is created
#[derive(Message)]
#[rtype(usize)]
pub struct Connect {
  pub addr: Recipient<WSMessage>,
  pub ip: IPAddr,
}

/// Session is disconnected
#[derive(Message)]
#[rtype(result = "()")]
pub struct Disconnect {
  pub id: ConnectionId,
  pub ip: IPAddr,
}

/// The messages sent to websocket clients
#[derive(Serialize, Deserialize, Message)]
#[rtype(result = "Option<String>")]
pub struct StandardMessage {
  /// Id of the client session
  pub id: ConnectionId,
  /// Peer message
  pub msg: String,
}

#[derive(Serialize, Deserialize)]
struct JoinGroupData {
  group_id: GroupId,
}

#[derive(Serialize, Deserialize)]
struct SendGroupMessageData {
  group_id: GroupId,
  message: String,
  username: String,
}

#[derive(Serialize)]
struct GroupMessageOut {
  message: String,
  username: String,
}

pub struct SessionInfo {
  pub addr: Recipient<WSMessage>,
  pub ip: IPAddr,
}

/// `ChatServer` manages the group rooms and is responsible for relaying
/// chat messages between the sessions in them.
pub struct ChatServer {
  /// A map from generated random ID to session addr
  pub sessions: HashMap<ConnectionId, SessionInfo>,

  /// A map from group id to set of connectionIDs
  pub group_rooms: HashMap<GroupId, HashSet<ConnectionId>>,

  rng: ThreadRng,
}

impl Default for ChatServer {
  fn default() -> Self {
    ChatServer::startup()
  }
}

impl ChatServer {
  pub fn startup() -> ChatServer {
    ChatServer {
      sessions: HashMap::new(),
      group_rooms: HashMap::new(),
      rng: rand::thread_rng(),
    }
  }

  // A session can sit in several group rooms at once, joining one
  // does not leave the others.
  pub fn join_group_room(&mut self, group_id: GroupId, id: ConnectionId) {
    if self.group_rooms.get_mut(&group_id).is_none() {
      self.group_rooms.insert(group_id, HashSet::new());
    }

    self.group_rooms.get_mut(&group_id).unwrap().insert(id);
  }

  fn send_group_room_message<Response>(
    &self,
    op: &UserOperation,
    response: &Response,
    group_id: GroupId,
    my_id: Option<ConnectionId>,
  ) -> Result<(), RantifyError>
  where
    Response: Serialize,
  {
    let res_str = &to_json_string(op, response)?;
    if let Some(sessions) = self.group_rooms.get(&group_id) {
      for id in sessions {
        if let Some(my_id) = my_id {
          if *id == my_id {
            continue;
          }
        }
        self.sendit(res_str, *id);
      }
    }
    Ok(())
  }

  fn sendit(&self, message: &str, id: ConnectionId) {
    if let Some(info) = self.sessions.get(&id) {
      let _ = info.addr.do_send(WSMessage(message.to_owned()));
    }
  }

  fn parse_json_message(&mut self, msg: StandardMessage) -> Result<Option<String>, RantifyError> {
    let json: Value = serde_json::from_str(&msg.msg)?;
    let data = json["data"].to_string();
    let op = json["op"]
      .as_str()
      .ok_or_else(|| crate::api::APIError::err("unknown_op"))?;

    let user_operation = UserOperation::from_str(op)?;

    match user_operation {
      UserOperation::JoinGroup => {
        let data: JoinGroupData = serde_json::from_str(&data)?;
        self.join_group_room(data.group_id, msg.id);
        Ok(None)
      }
      UserOperation::SendGroupMessage => {
        let data: SendGroupMessageData = serde_json::from_str(&data)?;
        // only members of the room hear it, and never the sender
        let out = GroupMessageOut {
          message: data.message,
          username: data.username,
        };
        self.send_group_room_message(&user_operation, &out, data.group_id, Some(msg.id))?;
        Ok(None)
      }
    }
  }
}

#[derive(Serialize)]
struct WebsocketResponse<T> {
  op: String,
  data: T,
}

pub fn to_json_string<Response>(op: &UserOperation, data: &Response) -> Result<String, RantifyError>
where
  Response: Serialize,
{
  let response = WebsocketResponse {
    op: op.to_string(),
    data,
  };
  Ok(serde_json::to_string(&response)?)
}

/// Make actor from `ChatServer`
impl Actor for ChatServer {
  /// We are going to use simple Context, we just need ability to communicate
  /// with other actors.
  type Context = Context<Self>;
}

/// Handler for Connect message.
///
/// Register new session and assign unique id to this session
impl Handler<Connect> for ChatServer {
  type Result = ConnectionId;

  fn handle(&mut self, msg: Connect, _ctx: &mut Context<Self>) -> Self::Result {
    // register session with random id
    let id = self.rng.gen::<usize>();
    info!("{} joined", &msg.ip);

    self.sessions.insert(
      id,
      SessionInfo {
        addr: msg.addr,
        ip: msg.ip,
      },
    );

    id
  }
}

/// Handler for Disconnect message.
impl Handler<Disconnect> for ChatServer {
  type Result = ();

  fn handle(&mut self, msg: Disconnect, _ctx: &mut Context<Self>) {
    if self.sessions.remove(&msg.id).is_some() {
      for sessions in self.group_rooms.values_mut() {
        sessions.remove(&msg.id);
      }
    }
  }
}

/// Handler for Message message.
impl Handler<StandardMessage> for ChatServer {
  type Result = Option<String>;

  fn handle(&mut self, msg: StandardMessage, _ctx: &mut Context<Self>) -> Self::Result {
    match self.parse_json_message(msg) {
      Ok(m) => m,
      Err(e) => {
        error!("Error during message handling {}", e);
        Some(e.to_string())
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::sync::{Arc, Mutex};

  /// Records everything the relay pushes at it.
  struct Recorder {
    received: Arc<Mutex<Vec<String>>>,
  }

  impl Actor for Recorder {
    type Context = Context<Self>;
  }

  impl Handler<WSMessage> for Recorder {
    type Result = ();

    fn handle(&mut self, msg: WSMessage, _ctx: &mut Context<Self>) {
      self.received.lock().unwrap().push(msg.0);
    }
  }

  async fn spawn_session(server: &Addr<ChatServer>) -> (ConnectionId, Arc<Mutex<Vec<String>>>) {
    let received = Arc::new(Mutex::new(Vec::new()));
    let recorder = Recorder {
      received: received.clone(),
    }
    .start();

    let id = server
      .send(Connect {
        addr: recorder.recipient(),
        ip: "127.0.0.1".to_string(),
      })
      .await
      .unwrap();

    (id, received)
  }

  async fn send_text(server: &Addr<ChatServer>, id: ConnectionId, msg: &str) -> Option<String> {
    server
      .send(StandardMessage {
        id,
        msg: msg.to_string(),
      })
      .await
      .unwrap()
  }

  #[actix_rt::test]
  async fn test_group_message_fan_out() {
    let server = ChatServer::startup().start();

    let (alice_id, alice_received) = spawn_session(&server).await;
    let (bob_id, bob_received) = spawn_session(&server).await;
    let (carol_id, carol_received) = spawn_session(&server).await;

    let join_msg =
      |group_id: i32| format!("{{\"op\":\"JoinGroup\",\"data\":{{\"group_id\":{}}}}}", group_id);

    assert!(send_text(&server, alice_id, &join_msg(1)).await.is_none());
    assert!(send_text(&server, bob_id, &join_msg(1)).await.is_none());
    // carol is in a different room
    assert!(send_text(&server, carol_id, &join_msg(2)).await.is_none());

    let res = send_text(
      &server,
      alice_id,
      "{\"op\":\"SendGroupMessage\",\"data\":{\"group_id\":1,\"message\":\"hi\",\"username\":\"alice\"}}",
    )
    .await;
    assert!(res.is_none());

    // give the recorder actors a chance to process their mailboxes
    actix_rt::time::delay_for(std::time::Duration::from_millis(50)).await;

    let bob_msgs = bob_received.lock().unwrap();
    assert_eq!(1, bob_msgs.len());
    let parsed: Value = serde_json::from_str(&bob_msgs[0]).unwrap();
    assert_eq!("SendGroupMessage", parsed["op"]);
    assert_eq!("hi", parsed["data"]["message"]);
    assert_eq!("alice", parsed["data"]["username"]);

    // the sender does not hear its own message
    assert!(alice_received.lock().unwrap().is_empty());
    // neither does anyone outside the room
    assert!(carol_received.lock().unwrap().is_empty());
  }

  #[actix_rt::test]
  async fn test_multi_room_membership() {
    let server = ChatServer::startup().start();

    let (alice_id, alice_received) = spawn_session(&server).await;
    let (bob_id, _bob_received) = spawn_session(&server).await;

    send_text(&server, alice_id, "{\"op\":\"JoinGroup\",\"data\":{\"group_id\":1}}").await;
    send_text(&server, alice_id, "{\"op\":\"JoinGroup\",\"data\":{\"group_id\":2}}").await;
    send_text(&server, bob_id, "{\"op\":\"JoinGroup\",\"data\":{\"group_id\":1}}").await;

    // joining room 2 must not have evicted alice from room 1
    send_text(
      &server,
      bob_id,
      "{\"op\":\"SendGroupMessage\",\"data\":{\"group_id\":1,\"message\":\"still here?\",\"username\":\"bob\"}}",
    )
    .await;

    actix_rt::time::delay_for(std::time::Duration::from_millis(50)).await;

    assert_eq!(1, alice_received.lock().unwrap().len());
  }

  #[actix_rt::test]
  async fn test_malformed_message_returns_error() {
    let server = ChatServer::startup().start();
    let (id, _received) = spawn_session(&server).await;

    let res = send_text(&server, id, "{\"op\":\"DropTables\",\"data\":{}}").await;
    assert!(res.is_some());

    let res = send_text(&server, id, "not json at all").await;
    assert!(res.is_some());
  }
}
