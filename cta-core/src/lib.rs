//! # cta-core: Análise de Textos Cuneiformes Transliterados
//!
//! Este crate implementa o motor de análise do CuneiformTextAnalysis: recebe um
//! manuscrito já extraído do documento de origem (seções → linhas → tokens
//! tipográficos) e produz estatísticas de sinais, estatísticas de formas de
//! palavra, um glossário de formas atestadas e uma exportação no formato ORACC
//! (ATF).
//!
//! ## Arquitetura do Sistema
//!
//! Todas as análises são funções puras sobre o manuscrito, sem estado
//! compartilhado:
//!
//! 1.  **Entrada**: [`Manuscript`] (JSON produzido pela camada de ingestão).
//! 2.  **Normalização** ([`normalizer`]): tokens de uma linha → texto anotado, por finalidade.
//! 3.  **Análises**:
//!     *   **Sinais** ([`signs`]): máquina de estados sobre colchetes e delimitações.
//!     *   **Palavras** ([`words`]): etiquetagem por delimitador e junção por hífen.
//!     *   **Glossário** ([`glossary`]): formas atestadas com a decoração de reconstrução.
//!     *   **ORACC** ([`oracc`], [`designation`]): validação de colchetes e montagem do ATF.
//! 4.  **Saída**: resultados + diagnósticos coletados (nenhuma análise aborta).
//!
//! ## Exemplo de Uso
//!
//! ```rust
//! use cta_core::{CtaPipeline, Manuscript, Section, Token, TokenKind};
//!
//! // 1. Um manuscrito com uma seção e uma linha
//! let manuscript = Manuscript::new().with_section(
//!     "obv. i",
//!     Section::new().with_line("A obv. i 1", vec![Token::new("lu-[ga]-al", TokenKind::Syllabic)]),
//! );
//!
//! // 2. Executa as quatro análises com as opções padrão
//! let report = CtaPipeline::new().analyze(&manuscript);
//!
//! // 3. Consulta os resultados
//! assert_eq!(report.signs.signs["ga"].reconstructed, 1);
//! assert_eq!(report.words.partially_reconstructed[0].form, "lu-ga-al");
//! assert!(report.oracc.document.contains("1. lu-[ga]-al"));
//! ```
//!
//! ## Módulos Principais
//!
//! - [`pipeline`]: Orquestrador que executa as análises e emite eventos.
//! - [`manuscript`]: Modelo de dados e leitura do JSON de ingestão.
//! - [`compare`]: Comparação do uso de sinais entre manuscritos.
//! - [`corpus`]: Manuscritos de demonstração.

pub mod compare;
pub mod config;
pub mod corpus;
pub mod designation;
pub mod error;
pub mod glossary;
pub mod manuscript;
pub mod normalizer;
pub mod oracc;
pub mod pipeline;
pub mod signs;
pub mod words;

pub use config::{AnalysisConfig, DoubleReadingPolicy, OraccOptions};
pub use error::{CoreError, SyntaxErrorRecord};
pub use manuscript::{LineContent, LineId, Manuscript, Section, Token, TokenKind};
pub use pipeline::{CtaPipeline, ManuscriptReport, PipelineEvent};
