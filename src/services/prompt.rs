use crate::catalog::Catalog;

const INSTRUCTION: &str = "あなたは業務自動化の専門コンサルタントです。
ユーザーの相談内容に基づいて、以下のサービスカタログから最適なシステム・サービスを3〜5件推薦してください。";

const ANSWER_RULES: &str = "## 回答ルール
- 必ずJSON形式で回答してください
- 各推薦に対して、id（プロジェクトID）、title、reason（なぜおすすめか・ユーザーの課題解決にどう役立つか）、matchScore（0-98の整数）を含めてください
- matchScoreは、ユーザーの要望との適合度を表します
- 完全一致の既存システムがない場合でも、カスタマイズ可能なシステムを提案してください
- 回答は日本語で

## 回答形式（必ずこのJSON形式のみ）
{\"recommendations\":[{\"id\":\"プロジェクトID\",\"title\":\"タイトル\",\"reason\":\"推薦理由\",\"matchScore\":85}]}";

/// Builds the fixed system prompt: instruction, catalog, answer rules, valid ids
pub fn build_system_prompt(catalog: &Catalog) -> String {
    let mut prompt = String::from(INSTRUCTION);
    prompt.push_str("\n\n## 提供サービスカタログ\n");

    let mut number = 0;
    for category in catalog.categories() {
        let members: Vec<_> = catalog
            .projects()
            .iter()
            .filter(|p| {
                catalog
                    .category(&p.category)
                    .is_some_and(|c| c.key == category.key)
            })
            .collect();
        if members.is_empty() {
            continue;
        }

        prompt.push_str(&format!("\n### {}\n", category.label));
        for project in members {
            number += 1;
            prompt.push_str(&format!(
                "{}. {}（{}）{}\n",
                number, project.title, project.summary, project.estimated_price
            ));
        }
    }

    prompt.push('\n');
    prompt.push_str(ANSWER_RULES);
    prompt.push_str("\n\nプロジェクトIDは以下を使用:\n");
    let ids: Vec<&str> = catalog.projects().iter().map(|p| p.id.as_str()).collect();
    prompt.push_str(&ids.join(", "));

    prompt
}

/// Appends the user's query to the system prompt
pub fn build_user_prompt(system_prompt: &str, query: &str) -> String {
    format!("{}\n\nユーザーの相談: {}", system_prompt, query)
}
