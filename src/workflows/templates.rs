//! Template-based copy generation.
//!
//! Every generator is pure over its input and the supplied RNG, so a seeded
//! RNG reproduces the same copy.

use rand::Rng;
use rand::seq::SliceRandom;

use super::model::{
    AdCopyInput, AdPlatform, BlogPostInput, EmailInput, EmailType, GeneratedContent, PostLength,
    ProductDescriptionInput, SocialPlatform, SocialPostInput, Tone, VideoScriptInput,
    WorkflowKind, WorkflowRequest,
};

/// Generate copy for any workflow.
pub fn generate<R: Rng + ?Sized>(request: &WorkflowRequest, rng: &mut R) -> GeneratedContent {
    match request {
        WorkflowRequest::ProductDescription(input) => product_description(input, rng),
        WorkflowRequest::BlogPost(input) => blog_post(input, rng),
        WorkflowRequest::SocialPost(input) => social_post(input, rng),
        WorkflowRequest::Email(input) => email(input, rng),
        WorkflowRequest::AdCopy(input) => ad_copy(input, rng),
        WorkflowRequest::VideoScript(input) => video_script(input, rng),
    }
}

/// Split a comma-separated list, dropping blanks.
pub fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn or_default<'a>(value: &'a str, fallback: &'a str) -> &'a str {
    let value = value.trim();
    if value.is_empty() { fallback } else { value }
}

fn pick<'a, R: Rng + ?Sized>(options: &[&'a str], rng: &mut R) -> &'a str {
    options.choose(rng).copied().unwrap_or_default()
}

fn opener(tone: Tone) -> &'static str {
    match tone {
        Tone::Professional => "Apresentamos",
        Tone::Casual => "Olha só que novidade:",
        Tone::Persuasive => "Chegou a hora de conhecer",
        Tone::Fun => "Prepare-se para se apaixonar por",
    }
}

fn product_description<R: Rng + ?Sized>(
    input: &ProductDescriptionInput,
    rng: &mut R,
) -> GeneratedContent {
    let name = input.product_name.trim();
    let audience = or_default(&input.target_audience, "quem busca qualidade");
    let features = split_list(&input.features);
    let customers = rng.gen_range(500..5000) * 10;
    let rating = rng.gen_range(45..=50) as f32 / 10.0;

    let mut body = format!(
        "{} {name}, pensado para {audience}.\n\n",
        opener(input.tone)
    );
    if features.is_empty() {
        body.push_str("Design cuidadoso, materiais de primeira e desempenho que você sente no dia a dia.\n\n");
    } else {
        body.push_str("Destaques:\n");
        for feature in &features {
            body.push_str(&format!("• {feature}\n"));
        }
        body.push('\n');
    }
    body.push_str(&format!(
        "Mais de {customers} clientes satisfeitos e nota média {rating:.1}/5. {}",
        pick(
            &[
                "Garanta o seu hoje mesmo.",
                "Experimente e sinta a diferença.",
                "Estoque limitado, aproveite.",
            ],
            rng,
        )
    ));

    GeneratedContent {
        workflow: WorkflowKind::ProductDescription,
        title: name.to_string(),
        body,
    }
}

fn blog_post<R: Rng + ?Sized>(input: &BlogPostInput, rng: &mut R) -> GeneratedContent {
    let topic = input.topic.trim();
    let audience = or_default(&input.audience, "profissionais e empreendedores");
    let keywords = split_list(&input.keywords);
    let sections = match input.length {
        PostLength::Short => 2,
        PostLength::Medium => 3,
        PostLength::Long => 5,
    };
    let growth = rng.gen_range(20..=80);

    let title = format!(
        "{}: {topic}",
        pick(
            &["Guia completo", "Tudo o que você precisa saber", "Descomplicando"],
            rng
        )
    );
    let mut body = format!(
        "Se você faz parte do grupo de {audience}, já percebeu que {topic} mudou o jogo. \
         Empresas que investem nisso relatam até {growth}% mais resultados.\n"
    );
    for i in 1..=sections {
        let focus = keywords
            .get(i - 1)
            .map(String::as_str)
            .unwrap_or(topic);
        body.push_str(&format!(
            "\n## {i}. {}\n{} {focus} {}\n",
            pick(
                &["Por onde começar", "Erros comuns", "Boas práticas", "Ferramentas úteis", "Próximos passos"],
                rng
            ),
            pick(&["Entender", "Dominar", "Aplicar"], rng),
            "com consistência faz toda a diferença para quem quer crescer.",
        ));
    }
    body.push_str("\n## Conclusão\nComece pequeno, meça os resultados e ajuste o caminho.");
    if !keywords.is_empty() {
        body.push_str(&format!("\n\nPalavras-chave: {}", keywords.join(", ")));
    }

    GeneratedContent {
        workflow: WorkflowKind::BlogPost,
        title,
        body,
    }
}

fn social_post<R: Rng + ?Sized>(input: &SocialPostInput, rng: &mut R) -> GeneratedContent {
    let topic = input.topic.trim();
    let hashtags: Vec<String> = split_list(&input.hashtags)
        .into_iter()
        .map(|tag| tag.trim_start_matches('#').replace(' ', ""))
        .filter(|tag| !tag.is_empty())
        .map(|tag| format!("#{tag}"))
        .collect();
    let cta = input
        .call_to_action
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .unwrap_or("Comente aqui o que você achou!");

    let emoji = match input.tone {
        Tone::Fun => pick(&["🎉", "🚀", "😍"], rng),
        Tone::Casual => pick(&["👀", "✨"], rng),
        _ => "",
    };
    let hook = match input.platform {
        SocialPlatform::Linkedin => format!("Uma reflexão sobre {topic}."),
        SocialPlatform::Twitter => format!("{topic} em poucas palavras:"),
        SocialPlatform::Instagram | SocialPlatform::Facebook => {
            format!("{} {topic} {emoji}", opener(input.tone))
        }
    };
    let percent = rng.gen_range(60..=95);

    let mut body = format!(
        "{}\n\n{percent}% do nosso público já aprovou. {cta}",
        hook.trim_end()
    );
    if !hashtags.is_empty() {
        body.push_str("\n\n");
        body.push_str(&hashtags.join(" "));
    }

    let platform = match input.platform {
        SocialPlatform::Instagram => "Instagram",
        SocialPlatform::Facebook => "Facebook",
        SocialPlatform::Linkedin => "LinkedIn",
        SocialPlatform::Twitter => "X/Twitter",
    };
    GeneratedContent {
        workflow: WorkflowKind::SocialPost,
        title: format!("Post para {platform}"),
        body,
    }
}

fn email<R: Rng + ?Sized>(input: &EmailInput, rng: &mut R) -> GeneratedContent {
    let offer = input.offer.trim();
    let audience = or_default(&input.audience, "cliente");
    let hours = rng.gen_range(24..=72);

    let (subject, intro) = match input.email_type {
        EmailType::Promotional => (
            format!("Oferta especial: {offer}"),
            format!("Olá, {audience}! Preparamos algo exclusivo para você: {offer}."),
        ),
        EmailType::Welcome => (
            "Boas-vindas! Que bom ter você aqui".to_string(),
            format!("Olá, {audience}! Obrigado por se juntar a nós. Para começar, conheça {offer}."),
        ),
        EmailType::Newsletter => (
            format!("Novidades da semana: {offer}"),
            format!("Olá, {audience}! Separamos os destaques desta semana, começando por {offer}."),
        ),
        EmailType::AbandonedCart => (
            "Você esqueceu algo no carrinho".to_string(),
            format!("Olá, {audience}! Notamos que {offer} ficou no seu carrinho."),
        ),
    };

    let mut body = intro;
    if let Some(discount) = input.discount.filter(|d| *d > 0) {
        body.push_str(&format!(
            "\n\nUse o cupom BEMVINDO{discount} e ganhe {discount}% de desconto nas próximas {hours} horas."
        ));
    }
    body.push_str(&format!(
        "\n\n{}\n\nAbraços,\nEquipe",
        pick(
            &["Clique no botão abaixo e aproveite.", "Não deixe para depois.", "Estamos esperando por você."],
            rng
        )
    ));

    GeneratedContent {
        workflow: WorkflowKind::Email,
        title: subject,
        body,
    }
}

fn ad_copy<R: Rng + ?Sized>(input: &AdCopyInput, rng: &mut R) -> GeneratedContent {
    let product = input.product.trim();
    let benefit = or_default(&input.benefit, "resultados reais");
    let audience = or_default(&input.audience, "você");
    let discount = rng.gen_range(1..=5) * 10;

    let body = match input.platform {
        AdPlatform::GoogleAds => format!(
            "Título 1: {product} | {benefit}\n\
             Título 2: Até {discount}% OFF Hoje\n\
             Título 3: Feito para {audience}\n\
             Descrição: {product} com {benefit}. {}",
            pick(&["Compre agora com frete grátis.", "Confira as condições especiais."], rng)
        ),
        AdPlatform::MetaAds => format!(
            "Texto principal: Cansado de esperar por {benefit}? {product} foi criado para {audience}.\n\
             Título: {product} com até {discount}% OFF\n\
             Chamada: {}",
            pick(&["Saiba mais", "Comprar agora", "Cadastre-se"], rng)
        ),
    };

    GeneratedContent {
        workflow: WorkflowKind::AdCopy,
        title: format!("Anúncio: {product}"),
        body,
    }
}

fn video_script<R: Rng + ?Sized>(input: &VideoScriptInput, rng: &mut R) -> GeneratedContent {
    let topic = input.topic.trim();
    let audience = or_default(&input.audience, "seu público");
    let mut points = split_list(&input.key_points);
    if points.is_empty() {
        points.push(format!("Por que {topic} importa"));
    }

    // Hook and closing take a fixed slice; the rest is split across points,
    // at least one second each.
    let total = input.duration_seconds;
    let hook = (total / 10).max(3);
    let closing = (total / 6).max(5);
    let budget = total.saturating_sub(hook + closing).max(1);
    points.truncate(budget as usize);
    let per_point = budget / points.len() as u32;

    let mut body = format!(
        "[0s - {hook}s] GANCHO: {} {topic}?\n",
        pick(&["Você sabia tudo sobre", "Já pensou em", "E se eu te contar um segredo sobre"], rng)
    );
    let mut t = hook;
    for point in &points {
        let end = t + per_point;
        body.push_str(&format!("[{t}s - {end}s] {point}: explique de forma direta para {audience}.\n"));
        t = end;
    }
    body.push_str(&format!(
        "[{t}s - {total}s] ENCERRAMENTO: {}",
        pick(&["Curta e compartilhe!", "Siga para mais dicas!", "Comente sua dúvida!"], rng)
    ));

    GeneratedContent {
        workflow: WorkflowKind::VideoScript,
        title: format!("Roteiro de {total}s: {topic}"),
        body,
    }
}
