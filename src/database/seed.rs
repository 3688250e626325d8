use chrono::NaiveDate;

use crate::models::activity::Activity;
use crate::models::answer::{Answer, AnswerSet};
use crate::models::question::{Question, QuestionKind};
use crate::models::recommendation::CustomerRecommendation;
use crate::models::submission::SubmissionRecord;
use crate::utils::time::from_unix;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap_or_default()
}

fn options(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

pub fn recommendations() -> Vec<CustomerRecommendation> {
    [
        ("1", "张伟", "13812345678", date(2023, 10, 12), "字节跳动", "职场精英保障计划"),
        ("2", "李芳", "13987654321", date(2023, 11, 5), "腾讯科技", "高管健康关怀"),
        ("3", "王强", "13700001111", date(2023, 11, 15), "阿里巴巴", "员工福利普惠"),
        ("4", "赵敏", "15011112222", date(2023, 12, 1), "百度集团", "家庭资产配置"),
        ("5", "孙悟空", "13366667777", date(2023, 12, 20), "花果山科技", "长寿健康保险"),
    ]
    .into_iter()
    .map(|(id, name, phone, wsm_date, enterprise, activity)| CustomerRecommendation {
        id: id.to_string(),
        name: name.to_string(),
        phone: phone.to_string(),
        wsm_date,
        enterprise: enterprise.to_string(),
        activity_name: activity.to_string(),
    })
    .collect()
}

pub fn activities() -> Vec<Activity> {
    [
        ("act1", "职域保障需求调研(2024夏季版)", 5, true, 1_715_000_000),
        ("act2", "养老风险深度评估专项调查", 8, true, 1_714_000_000),
        ("act3", "少儿教育储备金需求摸底", 4, true, 1_713_000_000),
        ("act4", "已过期下架活动示例", 10, false, 1_712_000_000),
    ]
    .into_iter()
    .map(|(id, title, question_count, is_available, created)| Activity {
        id: id.to_string(),
        title: title.to_string(),
        image: format!("https://picsum.photos/seed/{}/400/200", id),
        question_count,
        is_available,
        created_at: from_unix(created),
    })
    .collect()
}

pub fn questions() -> Vec<Question> {
    vec![
        Question {
            id: 1,
            kind: QuestionKind::Single,
            title: "您目前主要的理财偏好是什么？".to_string(),
            options: options(&["银行储蓄", "股票基金", "商业保险", "不动产投资"]),
            required: true,
        },
        Question {
            id: 2,
            kind: QuestionKind::Multiple,
            title: "您关注保险产品的哪些方面？（多选）".to_string(),
            options: options(&["公司品牌", "保障范围", "理赔速度", "增值服务", "保费高低"]),
            required: true,
        },
        Question {
            id: 3,
            kind: QuestionKind::Single,
            title: "您认为理想的年交保费占家庭收入的比例是多少？".to_string(),
            options: options(&["5%以内", "5%-10%", "10%-20%", "20%以上"]),
            required: true,
        },
        Question {
            id: 4,
            kind: QuestionKind::Single,
            title: "您近期是否有增加重疾保障的计划？".to_string(),
            options: options(&["已有且足够", "已有但考虑加保", "暂无但想了解", "完全不考虑"]),
            required: false,
        },
    ]
}

pub fn initial_results() -> Vec<SubmissionRecord> {
    let mut answers = AnswerSet::new();
    answers.insert(1, Answer::Single("商业保险".to_string()));
    answers.insert(
        2,
        Answer::Multiple(options(&["公司品牌", "理赔速度"])),
    );
    vec![SubmissionRecord {
        id: "res1".to_string(),
        customer_name: "周杰".to_string(),
        phone: "13544444444".to_string(),
        enterprise: "顺丰速运".to_string(),
        activity_name: "职域保障需求调研".to_string(),
        submitted_on: date(2024, 1, 15),
        answers,
    }]
}
