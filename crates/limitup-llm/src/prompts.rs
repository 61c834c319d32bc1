/// Value the model is told to use for fields it cannot find.
pub const NOT_FOUND: &str = "信息未找到";

/// Section keys of the requested JSON.
pub const COMPANY_SECTION: &str = "公司基本信息";
pub const INDICATOR_SECTION: &str = "主要财务指标";
pub const DISCUSSION_SECTION: &str = "管理层讨论与分析";

/// Joins a prompt and a document for providers without a system role.
pub fn with_document(prompt: &str, text: &str) -> String {
    format!("{prompt}\n\n以下是需要分析的财务报告内容:\n{text}")
}

/// The JSON template the model must fill in.
fn response_template() -> String {
    let template = serde_json::json!({
        COMPANY_SECTION: {
            "公司名称": "提取的公司全名",
            "股票代码": "股票代码",
            "所属行业": "所属行业",
            "主营业务": "详细的主营业务描述",
            "主要产品及用途": "主要产品和用途说明",
            "主要经营模式": "经营模式描述"
        },
        INDICATOR_SECTION: {
            "营业收入": "营业收入数值（单位：元）",
            "营业收入_亿元": "营业收入（单位：亿元）",
            "归属于上市公司股东的净利润": "净利润数值（单位：元）",
            "归属于上市公司股东的净利润_亿元": "净利润（单位：亿元）",
            "归属于上市公司股东的扣除非经常性损益的净利润": "扣非净利润数值（单位：元）",
            "归属于上市公司股东的扣除非经常性损益的净利润_亿元": "扣非净利润（单位：亿元）",
            "经营活动产生的现金流量净额": "经营现金流数值（单位：元）",
            "基本每股收益": "每股收益数值（单位：元/股）",
            "资产总额": "资产总额数值（单位：元）",
            "归属于上市公司股东的净资产": "净资产数值（单位：元）"
        },
        DISCUSSION_SECTION: {
            "所处行业情况": "报告期内公司所处行业的详细描述",
            "主要业务情况": "报告期内公司从事的主要业务详细说明",
            "核心竞争力": "公司核心竞争力分析",
            "主营业务分析": "主营业务的详细分析",
            "未来发展展望": "公司未来发展的展望和规划"
        }
    });
    serde_json::to_string_pretty(&template).unwrap_or_default()
}

/// Instructions for turning a periodic report into the structured summary.
pub fn financial_report_prompt() -> String {
    format!(
        "你是一个专业的财务分析师，请仔细分析以下财务报告内容，并按照以下结构化格式输出分析结果。\
         请确保输出的是有效的JSON格式。\n\n\
         请重点关注并提取以下信息：\n\n\
         **第二节 公司简介和主要财务指标**\n\
         1. 公司信息\n\
         2. 主要会计数据和财务指标\n\n\
         **第三节 管理层讨论与分析**\n\
         1. 报告期内公司所处行业情况\n\
         2. 报告期内公司从事的主要业务\n\
         3. 核心竞争力分析\n\
         4. 主营业务分析\n\
         5. 公司未来发展的展望\n\n\
         请严格按照以下JSON格式输出分析结果：\n\n\
         ```json\n{template}\n```\n\n\
         注意事项：\n\
         1. 如果某个字段无法从报告中提取到确切信息，请填写\"{NOT_FOUND}\"\n\
         2. 财务数据请保持原始单位，同时提供亿元单位的换算值\n\
         3. 描述性文字请尽可能详细完整，保留重要信息\n\
         4. 确保输出的是有效的JSON格式，可以被标准JSON解析器正确解析\n\
         5. 不要添加任何JSON格式之外的文本\n\n\
         现在请分析以下财务报告内容：\n",
        template = response_template()
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompt_embeds_parseable_template() {
        let prompt = financial_report_prompt();
        let start = prompt.find("```json\n").unwrap() + "```json\n".len();
        let end = start + prompt[start..].find("\n```").unwrap();
        let template: serde_json::Value = serde_json::from_str(&prompt[start..end]).unwrap();
        assert!(template[COMPANY_SECTION]["主营业务"].is_string());
        assert!(template[DISCUSSION_SECTION]["主要业务情况"].is_string());
        assert!(prompt.contains(NOT_FOUND));
    }

    #[test]
    fn document_follows_prompt() {
        assert_eq!(
            with_document("P", "T"),
            "P\n\n以下是需要分析的财务报告内容:\nT"
        );
    }
}
