//! Seed data: the starter topics the app ships with.

use crate::domain::Topic;

/// Built-in topics so the sidebar is never empty, even without a config
/// file or an API key. Fixed ids keep them stable across restarts.
pub fn seed_topics() -> Vec<Topic> {
  vec![
    Topic { id: "1".into(), name: "Viết tiếp câu chuyện từ nhân vật bạn yêu thích".into() },
    Topic { id: "2".into(), name: "Phát minh một thứ có thể thay đổi thế giới".into() },
    Topic { id: "3".into(), name: "Miêu tả một thế giới nơi con người có thêm một giác quan mới".into() },
  ]
}
