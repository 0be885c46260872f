pub mod server;

#[derive(EnumString, ToString, Debug, Clone)]
pub enum UserOperation {
  JoinGroup,
  SendGroupMessage,
}
