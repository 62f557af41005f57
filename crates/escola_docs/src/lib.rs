// School documents: monthly agendas (XLSX), learning guides and elective
// syllabi (DOCX rendered from Word templates).

pub mod agenda;
pub mod elective;
pub mod guide;
pub mod output;
pub mod scaffold;
pub mod sheet;
pub mod template;
pub mod text;

pub use agenda::{AgendaRequest, generate_agenda};
pub use elective::{ElectiveRequest, generate_elective};
pub use guide::{Cycle, GuideRequest, generate_guide};
pub use output::{Delivered, Delivery, GeneratedDocument};
pub use template::{DocxTemplate, TemplateContext};
