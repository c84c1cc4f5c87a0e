//! Loading app configuration (prompt templates + optional starter topics) from TOML.
//!
//! See `AppConfig` and `Prompts` for expected schema.

use serde::Deserialize;
use tracing::{error, info};

#[derive(Clone, Debug, Deserialize, Default)]
pub struct AppConfig {
  #[serde(default)]
  pub prompts: Prompts,
  #[serde(default)]
  pub topics: Vec<TopicCfg>,
}

/// Starter topic accepted in TOML configuration.
#[derive(Clone, Debug, Deserialize)]
pub struct TopicCfg {
  #[serde(default)] pub id: Option<String>,
  pub name: String,
}

/// Prompt templates used by the Gemini client. The defaults are the texts the
/// app ships with; override them in TOML to tune tone or difficulty.
/// Placeholders in `*_template` fields are substituted with `fill_template`.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Prompts {
  // Topic list
  pub random_topic_user: String,
  // Prompt battle
  pub battle_topic_user: String,
  pub battle_eval_user_template: String,
  // Prompt editor
  pub optimize_system: String,
  pub optimize_user_template: String,
  pub review_system: String,
  pub review_user_template: String,
  pub suggest_system: String,
  pub suggest_user_template: String,
  // Quiz
  pub quiz_question_user: String,
  pub quiz_eval_system: String,
  pub quiz_eval_user_template: String,
  pub quiz_image_style: String,
  // Twenty questions
  pub tq_secret_user: String,
  pub tq_answer_system: String,
  pub tq_answer_user_template: String,
  pub tq_hint_system: String,
  pub tq_hint_user_template: String,
  pub tq_hint_level1: String,
  pub tq_hint_level2: String,
  pub tq_hint_level3: String,
  pub tq_hint_level4: String,
  pub tq_guess_system: String,
  pub tq_guess_user_template: String,
}

/// The six-part prompt structure the tutor teaches. Repeated verbatim inside
/// several templates so each stays independently overridable.
const PROMPT_STRUCTURE: &str = "- Mô tả nhiệm vụ: Nêu rõ ràng những gì bạn muốn AI làm.\n- Ngữ cảnh: Cung cấp thông tin nền hoặc dữ liệu có liên quan.\n- Vai trò: Chỉ định vai trò hoặc tính cách mà bạn muốn AI đảm nhận.\n- Yêu cầu: Liệt kê các yêu cầu về phong cách, định dạng hoặc nội dung.\n- Giới hạn: Đặt ra giới hạn về những gì cần loại trừ hoặc tránh.\n- Lập luận: Yêu cầu AI giải thích lý luận hoặc cách tiếp cận của nó.";

impl Default for Prompts {
  fn default() -> Self {
    Self {
      random_topic_user: "Tạo một chủ đề ngẫu nhiên. Chủ đề này có thể là chủ đề học tập khác nhau (Toán, Văn, Lịch sử, v.v.), tình huống học tập thực tế (Ví dụ: Tạo danh sách kiểm tra bài tập, giải thích lý thuyết khoa học),... . Chỉ trả về tên chủ đề.".into(),

      battle_topic_user: "Tạo một chủ đề thi đấu dưới dạng một yêu cầu thực tế. Chỉ cần ngắn gọn, dễ hiểu để người chơi có thể có nhiều cách để viết một prompt để giải quyết vấn đề. Ví dụ: 'Nay bạn cần phải viết email để thông báo cho thầy cô về danh sách lớp học' Hãy tạo ra một tình huống tương tự. Chỉ trả về đoạn văn mô tả tình huống.".into(),
      battle_eval_user_template: format!("Chủ đề: \"{{topic}}\"\n\nĐây là một cuộc thi đánh giá độ hiểu quả của các câu prompt. Hãy đóng vai một giám khảo công tâm, chấm điểm từng prompt của người chơi dựa trên tiêu chí của cấu trúc sau:\n{PROMPT_STRUCTURE}\nCho điểm theo thang 1-100 và đưa ra nhận xét ngắn gọn, mang tính xây dựng.\n\nCác prompt cần chấm điểm:\n{{prompts}}\n\nHãy trả về kết quả dưới dạng JSON theo schema đã cung cấp."),

      optimize_system: "Bạn là một AI giảng viên chuyên nghiệp, giúp người dùng cải thiện câu văn prompt của mình. Hãy viết lại câu prompt của người dùng một cách hay hơn, đầy đủ nội dung hơn nhưng vẫn giữ ý chính. Hãy dùng từ ngữ đơn giản, dễ hiểu.".into(),
      optimize_user_template: format!("Chủ đề: \"{{topic}}\"\nCâu của người dùng: \"{{prompt}}\"\n\nHãy giúp người dùng viết lại prompt này theo cấu trúc đầy đủ sau:\n{PROMPT_STRUCTURE}\nChỉ trả về câu đã được viết lại."),
      review_system: "Bạn là một AI giảng viên tốt bụng và nhiệt tính, luôn động viên và khuyến khích người dùng Nhiệm vụ của bạn là đưa ra những lời khen và góp ý nhẹ nhàng để giúp câu văn của người dùng tốt hơn.".into(),
      review_user_template: format!("Chủ đề: \"{{topic}}\"\nCâu của người dùng: \"{{prompt}}\"\n\nHãy nhận xét câu prompt này một cách thật thân thiện. Bắt đầu bằng việc khen một điểm hay. Sau đó, hãy khuyên nhủ người dùng dựa trên cấu trúc prompt sau để phát huy tối đa hiệu quả khi giao tiếp với AI:\n{PROMPT_STRUCTURE}\nDùng ngôn ngữ tích cực và dễ hiểu nhé."),
      suggest_system: "Bạn là một chuyên gia về prompt engineering. Nhiệm vụ của bạn là tạo ra các prompt mẫu chất lượng cao.".into(),
      suggest_user_template: format!("Với chủ đề \"{{topic}}\", hãy tạo một danh sách gồm 3 prompt tối ưu và đa dạng. Các prompt này phải sáng tạo, rõ ràng, và có cấu trúc như sau:\n{PROMPT_STRUCTURE}\nCác prompt nên khác nhau về phong cách và mục tiêu."),

      quiz_question_user: "Tạo một câu đố vừa giải trí vừa thử thách trí tuệ cho học sinh từ lớp 6 đến lớp 12. Câu đố có thể là một câu hỏi mẹo, một câu đố logic, hoặc một câu hỏi kiến thức phổ thông thú vị. Chỉ trả về câu đố.".into(),
      quiz_eval_system: "Bạn là một người bạn AI vui vẻ, đang chơi đố vui với học sinh. Hãy đưa ra phản hồi thật nhẹ nhàng và khích lệ, đồng thời tạo ra một prompt tạo ảnh nghệ thuật liên quan đến câu trả lời đúng.".into(),
      quiz_eval_user_template: "Câu đố: \"{question}\"\nCâu trả lời của bạn học sinh: \"{answer}\"\n\nHãy thực hiện 2 việc:\n1. Đưa ra phản hồi về câu trả lời. Dù đúng hay sai, hãy luôn động viên. Nếu sai, giải thích đáp án đúng một cách đơn giản, vui vẻ.\n2. Tạo một câu prompt ngắn gọn (bằng tiếng Anh) để một AI tạo ảnh có thể vẽ một hình minh họa cho đáp án ĐÚNG của câu đố. Prompt này nên mô tả một cảnh đơn giản, tươi sáng và nghệ thuật.\n\nHãy trả về kết quả dưới dạng JSON theo schema đã cung cấp.".into(),
      quiz_image_style: ", digital art, vibrant colors, simple, for kids, cheerful".into(),

      tq_secret_user: "Tôi muốn chơi trò 20 câu hỏi. Hãy nghĩ về MỘT đồ vật, con vật, hoặc nhân vật nổi tiếng bất kỳ. Chỉ trả về TÊN của nó, không có thêm bất kỳ lời giải thích nào. Ví dụ: 'Quả chuối', 'Con mèo', 'Albert Einstein'.".into(),
      tq_answer_system: "Bạn đang chơi trò 20 câu hỏi. Bạn phải giữ bí mật từ khóa. Người chơi sẽ hỏi bạn những câu hỏi có-không để đoán ra từ đó. Bạn chỉ được phép trả lời bằng một trong ba cách sau: 'Có', 'Không', hoặc 'Không thể trả lời'. Đừng đưa ra bất kỳ lời giải thích nào khác.".into(),
      tq_answer_user_template: "Từ bí mật là: \"{secret}\".\n\nLịch sử hỏi đáp:\n{history}\n\nCâu hỏi mới của người chơi: \"{question}\"\n\nHãy trả lời câu hỏi mới này.".into(),
      tq_hint_system: "Bạn là người quản trò thông thái trong trò 20 câu hỏi. Nhiệm vụ của bạn là đưa ra một gợi ý hữu ích nhưng không quá lộ liễu, dựa trên mức độ đã được yêu cầu.".into(),
      tq_hint_user_template: "Từ bí mật là: \"{secret}\".\n\nLịch sử hỏi đáp:\n{history}\n\nNhiệm vụ: Dựa vào từ bí mật và lịch sử hỏi đáp, hãy tạo một câu gợi ý cho người chơi.\n\n{instruction}\n\nHãy chỉ trả về NỘI DUNG của câu gợi ý, không có tiền tố như 'Gợi ý:'.".into(),
      tq_hint_level1: "Gợi ý mức độ 1 (rất mơ hồ): Cho biết danh mục rất chung chung của từ bí mật (ví dụ: 'Nó là một đồ vật', 'Nó là một sinh vật sống', 'Nó là một khái niệm').".into(),
      tq_hint_level2: "Gợi ý mức độ 2 (cụ thể hơn): Cho biết một danh mục phụ hoặc một thuộc tính cơ bản (ví dụ: 'Nó là một loại trái cây', 'Nó được tìm thấy trong nhà bếp', 'Nó lớn hơn một chiếc bánh mì').".into(),
      tq_hint_level3: "Gợi ý mức độ 3 (khá rõ ràng): Mô tả một đặc điểm, công dụng hoặc màu sắc đặc trưng (ví dụ: 'Nó có màu vàng', 'Nó được dùng để viết', 'Nó có thể bay').".into(),
      tq_hint_level4: "Gợi ý mức độ 4 (rất rõ ràng): Đưa ra một gợi ý rất mạnh, gần như tiết lộ câu trả lời (ví dụ: 'Loài khỉ rất thích nó', 'Nó là bạn thân của chuột Jerry').".into(),
      tq_guess_system: "Bạn là giám khảo trong trò chơi 20 câu hỏi. Từ bí mật đã được xác định. Người chơi đã đưa ra một phỏng đoán cuối cùng. Hãy xác định xem phỏng đoán đó có chính xác hay không. Chỉ quan tâm đến sự tương đồng về mặt ý nghĩa, không cần phải chính xác từng từ.".into(),
      tq_guess_user_template: "Từ bí mật là: \"{secret}\".\n\nNgười chơi đoán rằng đó là: \"{guess}\".\n\nĐoán này có đúng không?".into(),
    }
  }
}

/// Attempt to load `AppConfig` from APP_CONFIG_PATH. On any parsing/IO error, returns None.
pub fn load_app_config_from_env() -> Option<AppConfig> {
  let path = std::env::var("APP_CONFIG_PATH").ok()?;
  match std::fs::read_to_string(&path) {
    Ok(s) => match toml::from_str::<AppConfig>(&s) {
      Ok(cfg) => {
        info!(target: "promptplay_backend", %path, "Loaded app config (TOML)");
        Some(cfg)
      }
      Err(e) => {
        error!(target: "promptplay_backend", %path, error = %e, "Failed to parse TOML config");
        None
      }
    },
    Err(e) => {
      error!(target: "promptplay_backend", %path, error = %e, "Failed to read TOML config file");
      None
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn default_prompts_carry_the_shared_structure() {
    let p = Prompts::default();
    for tpl in [&p.optimize_user_template, &p.review_user_template, &p.suggest_user_template, &p.battle_eval_user_template] {
      assert!(tpl.contains("Mô tả nhiệm vụ"), "structure block missing");
    }
  }

  #[test]
  fn partial_toml_overrides_single_field() {
    let cfg: AppConfig = toml::from_str(
      "[prompts]\nquiz_question_user = \"câu đố tùy chỉnh\"\n\n[[topics]]\nname = \"Chủ đề thử\"\n",
    )
    .unwrap();
    assert_eq!(cfg.prompts.quiz_question_user, "câu đố tùy chỉnh");
    // Untouched fields keep their defaults.
    assert_eq!(cfg.prompts.tq_hint_level4, Prompts::default().tq_hint_level4);
    assert_eq!(cfg.topics.len(), 1);
  }
}
