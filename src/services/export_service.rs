use crate::dto::report_dto::ResultDetail;
use crate::error::Result;
use rust_xlsxwriter::*;

pub struct ExportService;

impl ExportService {
    /// One line per answer, labelled with its prompt, in questionnaire order.
    fn answers_summary(detail: &ResultDetail) -> String {
        detail
            .answers
            .iter()
            .map(|echo| format!("{}：{}", echo.title, echo.display))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl ExportService {
    /// Styled XLSX workbook of the report list, in the order given. Rows carry
    /// the same masked identity and labelled answers as the detail view.
    pub fn generate_results_xlsx(details: &[ResultDetail]) -> Result<Vec<u8>> {
        let mut workbook = Workbook::new();
        let worksheet = workbook.add_worksheet();
        worksheet.set_name("问卷结果")?;

        // ── Color palette ──
        let primary_color = Color::RGB(0x1E293B);
        let header_bg = Color::RGB(0x0F172A);
        let header_text = Color::White;
        let alt_row_1 = Color::RGB(0xF8FAFC);
        let alt_row_2 = Color::White;
        let border_color = Color::RGB(0xE2E8F0);

        let columns = [
            ("序号", 8.0),
            ("客户姓名", 14.0),
            ("手机号", 18.0),
            ("企业名称", 24.0),
            ("活动名称", 28.0),
            ("提交日期", 14.0),
            ("答题内容", 60.0),
        ];
        let last_col = (columns.len() - 1) as u16;

        for (i, (_, width)) in columns.iter().enumerate() {
            worksheet.set_column_width(i as u16, *width)?;
        }

        // ── Title row ──
        let title_format = Format::new()
            .set_font_size(16)
            .set_bold()
            .set_font_color(header_text)
            .set_background_color(primary_color)
            .set_align(FormatAlign::CenterAcross)
            .set_align(FormatAlign::VerticalCenter);

        worksheet.set_row_height(0, 40)?;
        worksheet.merge_range(0, 0, 0, last_col, "面访问卷数据报表", &title_format)?;

        // ── Subtitle row ──
        let subtitle_format = Format::new()
            .set_font_size(10)
            .set_italic()
            .set_font_color(Color::RGB(0x94A3B8))
            .set_background_color(primary_color)
            .set_align(FormatAlign::CenterAcross)
            .set_align(FormatAlign::VerticalCenter);

        worksheet.set_row_height(1, 22)?;
        let now = chrono::Utc::now().format("%Y-%m-%d %H:%M UTC").to_string();
        let subtitle_text = format!("导出时间: {}  •  记录总数: {}", now, details.len());
        worksheet.merge_range(1, 0, 1, last_col, &subtitle_text, &subtitle_format)?;

        // ── Header row ──
        let header_format = Format::new()
            .set_bold()
            .set_font_size(10)
            .set_font_color(header_text)
            .set_background_color(header_bg)
            .set_align(FormatAlign::Center)
            .set_align(FormatAlign::VerticalCenter)
            .set_text_wrap()
            .set_border(FormatBorder::Thin)
            .set_border_color(border_color);

        let header_row = 2;
        worksheet.set_row_height(header_row, 30)?;
        for (i, (name, _)) in columns.iter().enumerate() {
            worksheet.write_string_with_format(header_row, i as u16, *name, &header_format)?;
        }

        // ── Data rows ──
        let data_start_row = header_row + 1;
        for (idx, detail) in details.iter().enumerate() {
            let summary = &detail.summary;
            let row = data_start_row + idx as u32;
            let bg = if idx % 2 == 0 { alt_row_1 } else { alt_row_2 };

            let base_fmt = Format::new()
                .set_font_size(10)
                .set_background_color(bg)
                .set_border(FormatBorder::Thin)
                .set_border_color(border_color)
                .set_align(FormatAlign::VerticalCenter);
            let center_fmt = base_fmt.clone().set_align(FormatAlign::Center);
            let wrap_fmt = base_fmt.clone().set_text_wrap();

            worksheet.write_number_with_format(row, 0, (idx + 1) as f64, &center_fmt)?;
            worksheet.set_row_height(row, 18.0 * detail.answers.len().max(1) as f64 + 4.0)?;
            worksheet.write_string_with_format(row, 1, &summary.customer_name, &base_fmt)?;
            worksheet.write_string_with_format(row, 2, &summary.phone, &center_fmt)?;
            worksheet.write_string_with_format(row, 3, &summary.enterprise, &base_fmt)?;
            worksheet.write_string_with_format(row, 4, &summary.activity_name, &base_fmt)?;
            let date_str = summary.submitted_on.format("%Y-%m-%d").to_string();
            worksheet.write_string_with_format(row, 5, &date_str, &center_fmt)?;
            worksheet.write_string_with_format(row, 6, Self::answers_summary(detail), &wrap_fmt)?;
        }

        worksheet.set_freeze_panes(data_start_row, 0)?;
        worksheet.autofilter(
            header_row,
            0,
            (data_start_row + details.len() as u32).saturating_sub(1).max(header_row),
            last_col,
        )?;

        let buffer = workbook.save_to_buffer()?;
        Ok(buffer)
    }
}
