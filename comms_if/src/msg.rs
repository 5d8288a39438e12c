//! # Bus Messages
//!
//! A message carries exactly one piece of content between two modules. The content determines the
//! logical type of the message, which is checked against the type a destination accepts before it
//! is delivered.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use chrono::{DateTime, Utc};

use crate::eqpt::helm::{HelmCmd, HelmParseError};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// A message passed between modules over the bus.
///
/// Messages are immutable once constructed.
#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    origin_id: String,
    destination_id: String,
    created_at: DateTime<Utc>,
    priority: Priority,
    content: MessageContent,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// Message priorities, in increasing order of severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Priority {
    Low,
    Normal,
    High,
    Critical,
}

/// The logical type of a message, determined by which content arm is populated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageType {
    Text,
    Number,
    Helm,
}

/// The content of a message.
#[derive(Debug, Clone, PartialEq)]
pub enum MessageContent {
    /// Free text
    Text(String),

    /// A single number
    Number(f64),

    /// A helm command string in the `<throttle,rudder>` format
    Helm(String),
}

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum MessageTypeError {
    #[error("All message data is empty")]
    NoContent,

    #[error("Message content must have exactly one populated field, found {0}")]
    MultipleContent(usize),

    #[error("Expected {expected:?} content but the message contains {found:?}")]
    WrongType {
        expected: MessageType,
        found: MessageType,
    },

    #[error("Helm content is malformed: {0}")]
    InvalidHelm(HelmParseError),
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl Message {
    /// Create a new message stamped with the current time.
    pub fn new<O, D>(
        origin_id: O,
        destination_id: D,
        priority: Priority,
        content: MessageContent,
    ) -> Self
    where
        O: Into<String>,
        D: Into<String>,
    {
        Self {
            origin_id: origin_id.into(),
            destination_id: destination_id.into(),
            created_at: Utc::now(),
            priority,
            content,
        }
    }

    /// Create a normal priority helm message carrying the given command.
    pub fn helm<O, D>(origin_id: O, destination_id: D, cmd: HelmCmd) -> Self
    where
        O: Into<String>,
        D: Into<String>,
    {
        Self::new(
            origin_id,
            destination_id,
            Priority::Normal,
            MessageContent::Helm(cmd.to_string()),
        )
    }

    pub fn origin_id(&self) -> &str {
        &self.origin_id
    }

    pub fn destination_id(&self) -> &str {
        &self.destination_id
    }

    pub fn created_at(&self) -> &DateTime<Utc> {
        &self.created_at
    }

    pub fn priority(&self) -> Priority {
        self.priority
    }

    pub fn content(&self) -> &MessageContent {
        &self.content
    }

    /// The logical type of the message.
    pub fn message_type(&self) -> MessageType {
        self.content.content_type()
    }
}

impl MessageContent {
    /// Build content from optional parts, exactly one of which must be populated.
    pub fn from_parts(
        text: Option<String>,
        number: Option<f64>,
        helm: Option<String>,
    ) -> Result<Self, MessageTypeError> {
        let num_populated = text.is_some() as usize
            + number.is_some() as usize
            + helm.is_some() as usize;

        match (text, number, helm) {
            (Some(t), None, None) => Ok(MessageContent::Text(t)),
            (None, Some(n), None) => Ok(MessageContent::Number(n)),
            (None, None, Some(h)) => Ok(MessageContent::Helm(h)),
            (None, None, None) => Err(MessageTypeError::NoContent),
            _ => Err(MessageTypeError::MultipleContent(num_populated)),
        }
    }

    pub fn content_type(&self) -> MessageType {
        match self {
            MessageContent::Text(_) => MessageType::Text,
            MessageContent::Number(_) => MessageType::Number,
            MessageContent::Helm(_) => MessageType::Helm,
        }
    }

    pub fn text(&self) -> Result<&str, MessageTypeError> {
        match self {
            MessageContent::Text(t) => Ok(t),
            _ => Err(self.wrong_type(MessageType::Text)),
        }
    }

    pub fn number(&self) -> Result<f64, MessageTypeError> {
        match self {
            MessageContent::Number(n) => Ok(*n),
            _ => Err(self.wrong_type(MessageType::Number)),
        }
    }

    pub fn helm(&self) -> Result<&str, MessageTypeError> {
        match self {
            MessageContent::Helm(h) => Ok(h),
            _ => Err(self.wrong_type(MessageType::Helm)),
        }
    }

    /// Parse the helm arm into throttle and rudder values.
    pub fn helm_cmd(&self) -> Result<HelmCmd, MessageTypeError> {
        self.helm()?.parse().map_err(MessageTypeError::InvalidHelm)
    }

    fn wrong_type(&self, expected: MessageType) -> MessageTypeError {
        MessageTypeError::WrongType {
            expected,
            found: self.content_type(),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_content_exclusivity() {
        let t = || Some(String::from("hello"));
        let n = || Some(4.2);
        let h = || Some(String::from("<1,2>"));

        assert_eq!(
            MessageContent::from_parts(None, None, None),
            Err(MessageTypeError::NoContent)
        );
        assert_eq!(
            MessageContent::from_parts(t(), n(), None),
            Err(MessageTypeError::MultipleContent(2))
        );
        assert_eq!(
            MessageContent::from_parts(t(), None, h()),
            Err(MessageTypeError::MultipleContent(2))
        );
        assert_eq!(
            MessageContent::from_parts(None, n(), h()),
            Err(MessageTypeError::MultipleContent(2))
        );
        assert_eq!(
            MessageContent::from_parts(t(), n(), h()),
            Err(MessageTypeError::MultipleContent(3))
        );
    }

    #[test]
    fn test_content_getters() {
        let text = MessageContent::from_parts(Some("hello".into()), None, None).unwrap();
        assert_eq!(text.content_type(), MessageType::Text);
        assert_eq!(text.text(), Ok("hello"));
        assert!(text.number().is_err());
        assert!(text.helm().is_err());

        let number = MessageContent::from_parts(None, Some(4.2), None).unwrap();
        assert_eq!(number.content_type(), MessageType::Number);
        assert_eq!(number.number(), Ok(4.2));
        assert!(number.text().is_err());
        assert!(number.helm().is_err());

        let helm = MessageContent::from_parts(None, None, Some("<1,2>".into())).unwrap();
        assert_eq!(helm.content_type(), MessageType::Helm);
        assert_eq!(helm.helm(), Ok("<1,2>"));
        assert_eq!(helm.helm_cmd(), Ok(HelmCmd::new(1.0, 2.0)));
        assert_eq!(
            helm.text(),
            Err(MessageTypeError::WrongType {
                expected: MessageType::Text,
                found: MessageType::Helm
            })
        );
        assert!(helm.number().is_err());
    }

    #[test]
    fn test_helm_message() {
        let msg = Message::helm("pilot", "helm", HelmCmd::new(50.0, -0.5));

        assert_eq!(msg.origin_id(), "pilot");
        assert_eq!(msg.destination_id(), "helm");
        assert_eq!(msg.priority(), Priority::Normal);
        assert_eq!(msg.message_type(), MessageType::Helm);
        assert_eq!(msg.content().helm(), Ok("<50,-0.5>"));

        let bad = MessageContent::Helm("50,-0.5".into());
        assert!(matches!(bad.helm_cmd(), Err(MessageTypeError::InvalidHelm(_))));
    }
}
