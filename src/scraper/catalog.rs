//! Canned event catalogs, one per platform.
//!
//! Start times are offsets from the moment of the fetch, so every catalog
//! entry is always in the future when produced.

use super::Platform;
use crate::models::Candidate;
use chrono::{DateTime, Duration, Utc};

pub struct Listing {
    pub title: &'static str,
    pub description: &'static str,
    pub host: &'static str,
    pub days_ahead: i64,
    pub duration_mins: u32,
    pub category: &'static str,
    pub tags: &'static [&'static str],
    pub registration_url: &'static str,
    pub meeting_url: &'static str,
    pub image_url: &'static str,
}

impl Listing {
    pub fn to_candidate(&self, platform: Platform, now: DateTime<Utc>) -> Candidate {
        Candidate {
            title: self.title.to_string(),
            description: self.description.to_string(),
            host: self.host.to_string(),
            scheduled_at: now + Duration::days(self.days_ahead),
            duration_mins: self.duration_mins,
            category: self.category.to_string(),
            tags: self.tags.iter().map(|t| t.to_string()).collect(),
            registration_url: self.registration_url.to_string(),
            meeting_url: Some(self.meeting_url.to_string()),
            image_url: Some(self.image_url.to_string()),
            source_platform: platform.name().to_string(),
        }
    }
}

pub fn listings(platform: Platform) -> &'static [Listing] {
    match platform {
        Platform::Eventbrite => EVENTBRITE,
        Platform::Meetup => MEETUP,
        Platform::Devpost => DEVPOST,
        Platform::Luma => LUMA,
        Platform::WebinarNinja => WEBINAR_NINJA,
        Platform::GoToWebinar => GOTO_WEBINAR,
        Platform::ZoomWebinar => ZOOM_WEBINAR,
    }
}

// ── Eventbrite ────────────────────────────────────────────────────────────────

const EVENTBRITE: &[Listing] = &[
    Listing {
        title: "Free Python Workshop: Build REST APIs with FastAPI",
        description: "Learn to build production-ready REST APIs using Python and FastAPI. Perfect for beginners and intermediate developers.",
        host: "TechMasters India",
        days_ahead: 2,
        duration_mins: 120,
        category: "Technology",
        tags: &["Python", "FastAPI", "REST API", "Backend"],
        registration_url: "https://eventbrite.com/e/python-fastapi-workshop",
        meeting_url: "https://zoom.us/j/example-python-workshop",
        image_url: "https://images.unsplash.com/photo-1526379095098-d400fd0bf935",
    },
    Listing {
        title: "Free Data Science Masterclass: Machine Learning Basics",
        description: "Introduction to machine learning concepts with hands-on examples using Python and scikit-learn.",
        host: "DataLearn Academy",
        days_ahead: 3,
        duration_mins: 90,
        category: "Data Science",
        tags: &["Machine Learning", "Python", "Data Science", "AI"],
        registration_url: "https://eventbrite.com/e/ml-masterclass",
        meeting_url: "https://meet.google.com/example-ml-class",
        image_url: "https://images.unsplash.com/photo-1551288049-bebda4e38f71",
    },
    Listing {
        title: "Free Digital Marketing Workshop: Social Media Strategy",
        description: "Learn effective social media marketing strategies for businesses. Includes practical exercises and case studies.",
        host: "Digital Growth Hub",
        days_ahead: 4,
        duration_mins: 150,
        category: "Marketing",
        tags: &["Digital Marketing", "Social Media", "Strategy", "Business"],
        registration_url: "https://eventbrite.com/e/digital-marketing-workshop",
        meeting_url: "https://teams.microsoft.com/example-marketing",
        image_url: "https://images.unsplash.com/photo-1460925895917-afdab827c52f",
    },
];

// ── Meetup ────────────────────────────────────────────────────────────────────

const MEETUP: &[Listing] = &[
    Listing {
        title: "Free React.js Workshop: Building Modern Web Apps",
        description: "Join us for a hands-on workshop covering React hooks, state management, and modern development practices.",
        host: "React Developers Mumbai",
        days_ahead: 5,
        duration_mins: 180,
        category: "Technology",
        tags: &["React", "JavaScript", "Frontend", "Web Development"],
        registration_url: "https://meetup.com/react-mumbai/events/react-workshop",
        meeting_url: "https://zoom.us/j/meetup-react-workshop",
        image_url: "https://images.unsplash.com/photo-1633356122544-f134324a6cee",
    },
    Listing {
        title: "Free AI/ML Study Group: Deep Learning Fundamentals",
        description: "Weekly study group covering deep learning concepts, neural networks, and practical implementations in TensorFlow.",
        host: "AI/ML Enthusiasts Delhi",
        days_ahead: 6,
        duration_mins: 120,
        category: "Data Science",
        tags: &["AI", "Machine Learning", "Deep Learning", "TensorFlow"],
        registration_url: "https://meetup.com/ai-ml-delhi/events/deep-learning-study",
        meeting_url: "https://meet.google.com/meetup-ai-study-group",
        image_url: "https://images.unsplash.com/photo-1555949963-aa79dcee981c",
    },
    Listing {
        title: "Free Startup Pitch Practice: Get Feedback from VCs",
        description: "Practice your startup pitch and get constructive feedback from experienced VCs and entrepreneurs.",
        host: "Bangalore Startup Network",
        days_ahead: 7,
        duration_mins: 150,
        category: "Business",
        tags: &["Startup", "Entrepreneurship", "Pitch", "VC"],
        registration_url: "https://meetup.com/bangalore-startups/events/pitch-practice",
        meeting_url: "https://teams.microsoft.com/meetup-startup-pitch",
        image_url: "https://images.unsplash.com/photo-1556761175-b413da4baf72",
    },
];

// ── Devpost ───────────────────────────────────────────────────────────────────

const DEVPOST: &[Listing] = &[
    Listing {
        title: "Free Blockchain Development Workshop: Build Your First DApp",
        description: "Learn to build decentralized applications using Ethereum, Solidity, and Web3.js. Perfect for developers new to blockchain.",
        host: "Blockchain Developers India",
        days_ahead: 8,
        duration_mins: 240,
        category: "Technology",
        tags: &["Blockchain", "Ethereum", "Solidity", "Web3", "DApp"],
        registration_url: "https://devpost.com/workshops/blockchain-dapp-workshop",
        meeting_url: "https://zoom.us/j/devpost-blockchain-workshop",
        image_url: "https://images.unsplash.com/photo-1639762681485-074b7f938ba0",
    },
    Listing {
        title: "Free Mobile App Development: React Native Crash Course",
        description: "Build cross-platform mobile apps with React Native. Covers navigation, state management, and deployment.",
        host: "Mobile Dev Community",
        days_ahead: 9,
        duration_mins: 180,
        category: "Technology",
        tags: &["React Native", "Mobile Development", "iOS", "Android", "JavaScript"],
        registration_url: "https://devpost.com/workshops/react-native-mobile-dev",
        meeting_url: "https://meet.google.com/devpost-mobile-workshop",
        image_url: "https://images.unsplash.com/photo-1512941937669-90a1b58e7e9c",
    },
    Listing {
        title: "Free FinTech Innovation Workshop: Payment Systems & APIs",
        description: "Explore modern payment systems, APIs, and financial technology trends. Learn to integrate payment solutions.",
        host: "FinTech Innovators",
        days_ahead: 10,
        duration_mins: 150,
        category: "Finance",
        tags: &["FinTech", "Payment Systems", "APIs", "Financial Technology", "Integration"],
        registration_url: "https://devpost.com/workshops/fintech-payment-systems",
        meeting_url: "https://teams.microsoft.com/devpost-fintech-workshop",
        image_url: "https://images.unsplash.com/photo-1563013544-824ae1b704d3",
    },
];

// ── Luma ──────────────────────────────────────────────────────────────────────

const LUMA: &[Listing] = &[
    Listing {
        title: "Free UI/UX Design Workshop: Design Systems & Figma",
        description: "Learn to create scalable design systems using Figma. Perfect for designers and developers working together.",
        host: "Design Community India",
        days_ahead: 11,
        duration_mins: 120,
        category: "Design",
        tags: &["UI/UX", "Design Systems", "Figma", "Product Design"],
        registration_url: "https://lu.ma/design-systems-workshop",
        meeting_url: "https://zoom.us/j/luma-design-workshop",
        image_url: "https://images.unsplash.com/photo-1561070791-2526d30994b5",
    },
    Listing {
        title: "Free Developer Career Workshop: From Code to Leadership",
        description: "Navigate your tech career path from junior developer to tech lead. Insights from industry experts.",
        host: "Tech Career Mentors",
        days_ahead: 12,
        duration_mins: 90,
        category: "Career",
        tags: &["Career Development", "Tech Leadership", "Mentorship", "Professional Growth"],
        registration_url: "https://lu.ma/developer-career-workshop",
        meeting_url: "https://meet.google.com/luma-career-workshop",
        image_url: "https://images.unsplash.com/photo-1521737604893-d14cc237f11d",
    },
];

// ── WebinarNinja ──────────────────────────────────────────────────────────────

const WEBINAR_NINJA: &[Listing] = &[
    Listing {
        title: "Free Content Marketing Masterclass: Drive Traffic Without Ads",
        description: "Learn proven content marketing strategies to attract your ideal customers organically. No paid advertising required.",
        host: "Digital Marketing Academy",
        days_ahead: 13,
        duration_mins: 90,
        category: "Marketing",
        tags: &["Content Marketing", "Organic Traffic", "SEO", "Digital Strategy"],
        registration_url: "https://webinarninja.com/content-marketing-masterclass",
        meeting_url: "https://zoom.us/j/webinarninja-content-marketing",
        image_url: "https://images.unsplash.com/photo-1432888622747-4eb9a8efeb07",
    },
    Listing {
        title: "Free Business Growth Workshop: Scale to 7 Figures",
        description: "Discover the exact systems and strategies used by successful entrepreneurs to scale their businesses to 7 figures.",
        host: "Business Growth Institute",
        days_ahead: 14,
        duration_mins: 120,
        category: "Business",
        tags: &["Business Growth", "Scaling", "Entrepreneurship", "Strategy"],
        registration_url: "https://webinarninja.com/business-growth-workshop",
        meeting_url: "https://meet.google.com/webinarninja-business-growth",
        image_url: "https://images.unsplash.com/photo-1507003211169-0a1dd7228f2d",
    },
    Listing {
        title: "Free Health & Wellness Coaching Certification Overview",
        description: "Explore the fundamentals of health coaching and discover if this rewarding career path is right for you.",
        host: "Wellness Coaching Institute",
        days_ahead: 15,
        duration_mins: 75,
        category: "Health",
        tags: &["Health Coaching", "Wellness", "Certification", "Career Development"],
        registration_url: "https://webinarninja.com/health-coaching-overview",
        meeting_url: "https://teams.microsoft.com/webinarninja-health-coaching",
        image_url: "https://images.unsplash.com/photo-1571019613454-1cb2f99b2d8b",
    },
];

// ── GoToWebinar ───────────────────────────────────────────────────────────────

const GOTO_WEBINAR: &[Listing] = &[
    Listing {
        title: "Free Leadership Workshop: Managing Remote Teams Effectively",
        description: "Master the art of leading distributed teams with practical strategies from experienced managers and executives.",
        host: "Leadership Excellence Institute",
        days_ahead: 16,
        duration_mins: 60,
        category: "Business",
        tags: &["Leadership", "Remote Work", "Team Management", "Executive Skills"],
        registration_url: "https://gotowebinar.logmein.com/leadership-remote-teams",
        meeting_url: "https://global.gotowebinar.com/join/leadership-session",
        image_url: "https://images.unsplash.com/photo-1600880292203-757bb62b4baf",
    },
    Listing {
        title: "Free Sales Training: Close More Deals with Modern Techniques",
        description: "Learn cutting-edge sales methodologies that top performers use to consistently exceed their quotas.",
        host: "Sales Mastery Academy",
        days_ahead: 17,
        duration_mins: 90,
        category: "Business",
        tags: &["Sales", "Closing Techniques", "Revenue Growth", "B2B Sales"],
        registration_url: "https://gotowebinar.logmein.com/sales-training-masterclass",
        meeting_url: "https://global.gotowebinar.com/join/sales-masterclass",
        image_url: "https://images.unsplash.com/photo-1553028826-f4804151e296",
    },
    Listing {
        title: "Free Productivity Workshop: Time Management for Professionals",
        description: "Discover proven time management systems and productivity hacks used by top executives and entrepreneurs.",
        host: "Productivity Pro Institute",
        days_ahead: 18,
        duration_mins: 75,
        category: "Professional Development",
        tags: &["Productivity", "Time Management", "Efficiency", "Work-Life Balance"],
        registration_url: "https://gotowebinar.logmein.com/productivity-workshop",
        meeting_url: "https://global.gotowebinar.com/join/productivity-session",
        image_url: "https://images.unsplash.com/photo-1484480974693-6ca0a78fb36b",
    },
];

// ── Zoom Webinars ─────────────────────────────────────────────────────────────

const ZOOM_WEBINAR: &[Listing] = &[
    Listing {
        title: "Free Digital Transformation Workshop: Future-Proof Your Business",
        description: "Learn how to leverage technology to streamline operations, improve customer experience, and drive growth in 2025.",
        host: "Digital Innovation Institute",
        days_ahead: 19,
        duration_mins: 90,
        category: "Technology",
        tags: &["Digital Transformation", "Innovation", "Automation", "Business Strategy"],
        registration_url: "https://zoom.us/webinar/register/digital-transformation-2025",
        meeting_url: "https://zoom.us/j/digital-transformation-workshop",
        image_url: "https://images.unsplash.com/photo-1451187580459-43490279c0fa",
    },
    Listing {
        title: "Free Healthcare Tech Innovation Summit - Virtual Session",
        description: "Explore cutting-edge healthcare technologies including telemedicine, AI diagnostics, and patient care innovations.",
        host: "HealthTech Leaders Alliance",
        days_ahead: 20,
        duration_mins: 120,
        category: "Healthcare",
        tags: &["HealthTech", "Telemedicine", "AI in Healthcare", "Patient Care", "Medical Innovation"],
        registration_url: "https://zoom.us/webinar/register/healthcare-innovation-summit",
        meeting_url: "https://zoom.us/j/healthcare-tech-summit",
        image_url: "https://images.unsplash.com/photo-1576091160399-112ba8d25d1f",
    },
    Listing {
        title: "Free EdTech Revolution: Transforming Learning in 2025",
        description: "Discover innovative educational technologies, online learning platforms, and student engagement strategies.",
        host: "Education Technology Council",
        days_ahead: 21,
        duration_mins: 75,
        category: "Education",
        tags: &["EdTech", "Online Learning", "Student Engagement", "Educational Innovation", "Learning Management"],
        registration_url: "https://zoom.us/webinar/register/edtech-revolution-2025",
        meeting_url: "https://zoom.us/j/edtech-revolution",
        image_url: "https://images.unsplash.com/photo-1503676260728-1c00da094a0b",
    },
    Listing {
        title: "Free FinTech Innovation Workshop: Digital Banking & Payments",
        description: "Learn about blockchain, cryptocurrency, digital payments, and the future of financial services.",
        host: "Financial Technology Institute",
        days_ahead: 22,
        duration_mins: 100,
        category: "Finance",
        tags: &["FinTech", "Blockchain", "Digital Payments", "Cryptocurrency", "Banking Innovation"],
        registration_url: "https://zoom.us/webinar/register/fintech-innovation-workshop",
        meeting_url: "https://zoom.us/j/fintech-innovation",
        image_url: "https://images.unsplash.com/photo-1563013544-824ae1b704d3",
    },
    Listing {
        title: "Free Advanced Marketing Analytics: Data-Driven Growth Strategies",
        description: "Master marketing analytics, customer segmentation, and performance optimization to accelerate business growth.",
        host: "MarketingPro Academy",
        days_ahead: 23,
        duration_mins: 85,
        category: "Marketing",
        tags: &["Marketing Analytics", "Data Science", "Customer Segmentation", "Growth Hacking", "Performance Marketing"],
        registration_url: "https://zoom.us/webinar/register/marketing-analytics-masterclass",
        meeting_url: "https://zoom.us/j/marketing-analytics",
        image_url: "https://images.unsplash.com/photo-1460925895917-afdab827c52f",
    },
];
