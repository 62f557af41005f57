//! Starter Word templates carrying every placeholder the generators fill.
//! Schools replace them with their own layouts; the placeholders are what
//! matters.

use docx_rs::*;
use escola_core::{EscolaConfig, EscolaError, Result};
use std::io::Cursor;
use std::path::PathBuf;
use tracing::info;

/// Build a template: a large bold title, `label: value` lines, then one bold
/// heading per section followed by its body.
fn build_template(title: &str, fields: &[(&str, &str)], sections: &[(&str, &str)]) -> Result<Vec<u8>> {
    let mut docx = Docx::new();

    let title_run = Run::new().add_text(title).bold().size(36); // 18pt
    docx = docx.add_paragraph(Paragraph::new().add_run(title_run));
    docx = docx.add_paragraph(Paragraph::new());

    for (label, value) in fields {
        let paragraph = Paragraph::new()
            .add_run(Run::new().add_text(format!("{label}: ")).bold().size(22))
            .add_run(Run::new().add_text(*value).size(22));
        docx = docx.add_paragraph(paragraph);
    }
    docx = docx.add_paragraph(Paragraph::new());

    for (heading, body) in sections {
        let heading_run = Run::new().add_text(*heading).bold().size(28); // 14pt
        docx = docx.add_paragraph(Paragraph::new().add_run(heading_run));
        docx = docx.add_paragraph(Paragraph::new().add_run(Run::new().add_text(*body).size(22)));
        docx = docx.add_paragraph(Paragraph::new());
    }

    let mut buf = Cursor::new(Vec::new());
    docx.build()
        .pack(&mut buf)
        .map_err(|e| EscolaError::Render(format!("falha ao empacotar DOCX: {e}")))?;

    Ok(buf.into_inner())
}

/// Learning guide template (`Professor`, `Disciplina`, `AnoSerie`, `Bimestre`,
/// `Titulo`, `Conteudo`, `Objetivos`, `Fontes`).
pub fn guide_template() -> Result<Vec<u8>> {
    build_template(
        "GUIA DE APRENDIZAGEM",
        &[
            ("Professor(a)", "{{ Professor }}"),
            ("Componente curricular", "{{ Disciplina }}"),
            ("Ano/Série", "{{ AnoSerie }}"),
            ("Bimestre", "{{ Bimestre }}"),
        ],
        &[
            ("Aulas", "{{ Titulo }}"),
            ("Conteúdos", "{{ Conteudo }}"),
            ("Objetivos de aprendizagem", "{{ Objetivos }}"),
            ("Fontes de estudo", "{{ Fontes }}"),
        ],
    )
}

/// Elective syllabus template (uppercase placeholders, `ANO_SERIE` already
/// carries its own `" - "` prefix).
pub fn elective_template() -> Result<Vec<u8>> {
    build_template(
        "EMENTA DE ELETIVA{{ ANO_SERIE }}",
        &[
            ("Título", "{{ TITULO }}"),
            ("Tema", "{{ TEMA }}"),
            ("Professor(a)", "{{ PROFESSOR1 }}"),
            ("Professor(a)", "{{ PROFESSOR2 }}"),
        ],
        &[
            ("Justificativa", "{{ JUSTIFICATIVA }}"),
            ("Objetivo", "{{ OBJETIVO }}"),
            ("Habilidades", "{{ HABILIDADES }}"),
            ("Conteúdo programático", "{{ CONTEUDO }}"),
            ("Metodologia", "{{ METODOLOGIA }}"),
            ("Recursos", "{{ RECURSOS }}"),
            ("Culminância", "{{ CULMINANCIA }}"),
            ("Referências", "{{ REFERENCIA }}"),
            ("Gerado em", "{{ DATA_GERACAO }}"),
        ],
    )
}

/// Write both starter templates into the configured templates directory.
/// Existing files are kept unless `overwrite` is set. Returns the paths
/// that were written.
pub fn write_templates(config: &EscolaConfig, overwrite: bool) -> Result<Vec<PathBuf>> {
    std::fs::create_dir_all(config.templates_path())?;

    let templates = [
        (config.guide_template_path(), guide_template()?),
        (config.elective_template_path(), elective_template()?),
    ];

    let mut written = Vec::new();
    for (path, bytes) in templates {
        if path.exists() && !overwrite {
            info!(path = %path.display(), "template exists, keeping it");
            continue;
        }
        std::fs::write(&path, bytes)?;
        info!(path = %path.display(), "template written");
        written.push(path);
    }
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::template::DocxTemplate;

    #[test]
    fn test_guide_template_placeholders() {
        let template = DocxTemplate::from_bytes(guide_template().unwrap()).unwrap();
        let names: Vec<String> = template.placeholders().unwrap().into_iter().collect();
        assert_eq!(
            names,
            vec![
                "AnoSerie",
                "Bimestre",
                "Conteudo",
                "Disciplina",
                "Fontes",
                "Objetivos",
                "Professor",
                "Titulo"
            ]
        );
    }

    #[test]
    fn test_elective_template_placeholders() {
        let template = DocxTemplate::from_bytes(elective_template().unwrap()).unwrap();
        let names = template.placeholders().unwrap();
        assert_eq!(names.len(), 14);
        assert!(names.contains("ANO_SERIE"));
        assert!(names.contains("DATA_GERACAO"));
    }

    #[test]
    fn test_write_templates_respects_overwrite() {
        let tmp = tempfile::tempdir().unwrap();
        let config = EscolaConfig::with_base_path(tmp.path());

        let written = write_templates(&config, false).unwrap();
        assert_eq!(written.len(), 2);
        assert!(config.guide_template_path().exists());

        std::fs::write(config.guide_template_path(), b"custom").unwrap();
        assert!(write_templates(&config, false).unwrap().is_empty());
        assert_eq!(std::fs::read(config.guide_template_path()).unwrap(), b"custom");

        assert_eq!(write_templates(&config, true).unwrap().len(), 2);
        assert_ne!(std::fs::read(config.guide_template_path()).unwrap(), b"custom");
    }
}
